//! `data:<mime>;base64,<payload>` helpers for previews and captured stills.

use base64::Engine;

use crate::error::PhotoError;

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, b64)
}

/// MIME type between `data:` and the first `;` of the header
pub fn mime_of(data_url: &str) -> Option<&str> {
    let (header, _) = data_url.split_once(',')?;
    let rest = header.strip_prefix("data:")?;
    let (mime, _) = rest.split_once(';')?;
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}

/// Split a base64 data URL into its MIME type and decoded bytes
pub fn decode(data_url: &str) -> Result<(String, Vec<u8>), PhotoError> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| malformed("missing ',' separator"))?;

    if !header.starts_with("data:") {
        return Err(malformed("missing 'data:' scheme"));
    }
    if !header.ends_with(";base64") {
        return Err(malformed("payload is not base64 encoded"));
    }

    let mime = mime_of(data_url).ok_or_else(|| malformed("missing MIME type"))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| malformed(&e.to_string()))?;

    Ok((mime.to_string(), bytes))
}

fn malformed(details: &str) -> PhotoError {
    PhotoError::MalformedDataUrl {
        details: details.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parsing() {
        let url = encode("image/png", &[1, 2, 3]);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(mime_of(&url), Some("image/png"));

        let (mime, bytes) = decode(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_rejects_malformed_urls() {
        assert!(matches!(
            decode("image/png;base64,AAAA"),
            Err(PhotoError::MalformedDataUrl { .. })
        ));
        assert!(decode("data:image/png,plain").is_err());
        assert!(decode("data:;base64,AAAA").is_err());
        assert!(decode("data:image/png;base64,@@@").is_err());
        assert_eq!(mime_of("no header"), None);
    }
}

//! Story browsing: list stories and pin the geotagged ones on a display map.

use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::{Story, StoryCatalog};
use crate::error::Result;
use crate::geo::LatLngBounds;
use crate::map::{LocationPicker, StoryMarker};

/// Outcome of one feed refresh
#[derive(Debug, Clone)]
pub struct FeedSummary {
    pub stories: Vec<Story>,
    pub mapped: usize,
    pub bounds: Option<LatLngBounds>,
}

pub struct StoryFeed {
    catalog: Arc<dyn StoryCatalog>,
    picker: LocationPicker,
}

impl StoryFeed {
    /// `picker` should be an initialized display-mode map
    pub fn new(catalog: Arc<dyn StoryCatalog>, picker: LocationPicker) -> Self {
        Self { catalog, picker }
    }

    pub fn picker(&self) -> &LocationPicker {
        &self.picker
    }

    /// Fetch stories, replace the map's markers and frame them
    pub async fn load(&self) -> Result<FeedSummary> {
        let stories = self.catalog.stories(true).await?;
        let markers: Vec<StoryMarker> = stories.iter().filter_map(story_marker).collect();

        debug!(
            "{} of {} stories carry a location",
            markers.len(),
            stories.len()
        );

        let mapped = self.picker.add_markers(&markers)?;
        let bounds = self.picker.fit_to_markers()?;

        info!("Loaded {} stories, {} on the map", stories.len(), mapped);
        Ok(FeedSummary {
            stories,
            mapped,
            bounds,
        })
    }
}

/// Map pin for `story`, or `None` when it has no usable coordinates
pub fn story_marker(story: &Story) -> Option<StoryMarker> {
    let position = story.location()?;
    Some(StoryMarker {
        position,
        title: story.name.clone(),
        popup_content: popup_content(story),
    })
}

pub fn popup_content(story: &Story) -> String {
    let posted = story
        .created_at
        .with_timezone(&Local)
        .format("%-d %B %Y %H:%M");
    format!(
        "<h3>{}</h3><p>{}</p><small>{}</small>",
        escape_html(&story.name),
        escape_html(&story.description),
        posted
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StorycamError, SubmissionError};
    use crate::geo::SelectedLocation;
    use crate::map::{FixedGeolocation, MapMode, MemoryMap, PickerOptions};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct FixedCatalog {
        stories: Option<Vec<Story>>,
    }

    #[async_trait]
    impl StoryCatalog for FixedCatalog {
        async fn stories(
            &self,
            with_location: bool,
        ) -> std::result::Result<Vec<Story>, SubmissionError> {
            assert!(with_location);
            self.stories
                .clone()
                .ok_or(SubmissionError::NetworkUnavailable)
        }
    }

    fn story(id: &str, lat: Option<f64>, lon: Option<f64>) -> Story {
        Story {
            id: id.to_string(),
            name: format!("Author {}", id),
            description: format!("Story {}", id),
            photo_url: format!("https://example.com/{}.jpg", id),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            lat,
            lon,
        }
    }

    fn display_map() -> (LocationPicker, Arc<MemoryMap>) {
        let backend = Arc::new(MemoryMap::new());
        let picker = LocationPicker::new(
            backend.clone(),
            Arc::new(FixedGeolocation::unsupported()),
            MapMode::Display,
            PickerOptions::default(),
        );
        let center = SelectedLocation::new(-6.2088, 106.8456).unwrap();
        picker.initialize("stories-map", center).unwrap();
        (picker, backend)
    }

    #[tokio::test]
    async fn test_load_pins_only_located_stories() {
        let (picker, backend) = display_map();
        let catalog = Arc::new(FixedCatalog {
            stories: Some(vec![
                story("a", Some(-6.2), Some(106.8)),
                story("b", None, None),
                story("c", Some(-8.65), Some(115.2)),
                story("d", Some(200.0), Some(0.0)),
            ]),
        });
        let feed = StoryFeed::new(catalog, picker.clone());

        let summary = feed.load().await.unwrap();

        assert_eq!(summary.stories.len(), 4);
        assert_eq!(summary.mapped, 2);
        let bounds = summary.bounds.unwrap();
        assert!(bounds.contains(SelectedLocation::new(-7.0, 110.0).unwrap()));

        let map = picker.map_id().unwrap();
        let snapshot = backend.snapshot(map).unwrap();
        assert_eq!(snapshot.markers.len(), 2);
        assert_eq!(snapshot.fitted_bounds, Some(bounds));
    }

    #[tokio::test]
    async fn test_load_failure_leaves_map_untouched() {
        let (picker, backend) = display_map();
        let feed = StoryFeed::new(Arc::new(FixedCatalog { stories: None }), picker.clone());

        let error = feed.load().await.unwrap_err();

        assert!(matches!(
            error,
            StorycamError::Submission(SubmissionError::NetworkUnavailable)
        ));
        assert_eq!(backend.marker_count(picker.map_id().unwrap()), 0);
    }

    #[test]
    fn test_popup_escapes_markup() {
        let mut s = story("x", Some(1.0), Some(1.0));
        s.description = "<script>alert('hi')</script> & more".to_string();

        let marker = story_marker(&s).unwrap();

        assert_eq!(marker.title, "Author x");
        assert!(marker.popup_content.starts_with("<h3>Author x</h3>"));
        let escaped = "&lt;script&gt;alert(&#39;hi&#39;)&lt;/script&gt; &amp; more";
        assert!(marker.popup_content.contains(escaped));
        assert!(marker.popup_content.contains("2024"));
    }
}

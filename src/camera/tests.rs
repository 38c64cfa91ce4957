use super::*;
use crate::error::{
    CameraError, DeviceAccessError, GeolocationError, PhotoError, StorycamError, SubmissionError,
    UserFacing,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct RecordingSink {
    attached: Mutex<Option<String>>,
    attach_count: Mutex<usize>,
}

impl VideoSink for RecordingSink {
    fn attach(&self, stream: &StreamInfo) {
        *self.attached.lock() = Some(stream.id.clone());
        *self.attach_count.lock() += 1;
    }

    fn detach(&self) {
        *self.attached.lock() = None;
    }
}

fn small_policy() -> CameraPolicy {
    CameraPolicy {
        ideal_resolution: (64, 48),
        ..CameraPolicy::default()
    }
}

fn create_session(device: Arc<SyntheticCamera>) -> (CameraSession, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let session = CameraSession::new(device, sink.clone(), small_policy());
    (session, sink)
}

#[tokio::test]
async fn test_start_attaches_single_live_stream() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, sink) = create_session(device.clone());

    assert_eq!(session.phase(), CameraPhase::Idle);

    let info = session.start(FacingMode::Environment).await.unwrap();

    assert_eq!(session.phase(), CameraPhase::Live);
    assert_eq!(info.facing, FacingMode::Environment);
    assert_eq!(device.live_stream_count(), 1);
    assert_eq!(sink.attached.lock().as_deref(), Some(info.id.as_str()));
    assert_eq!(device.requested_facings(), vec![FacingMode::Environment]);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, sink) = create_session(device.clone());

    session.stop().await;
    session.start(FacingMode::User).await.unwrap();
    session.stop().await;
    session.stop().await;

    assert_eq!(session.phase(), CameraPhase::Idle);
    assert_eq!(device.live_stream_count(), 0);
    assert!(sink.attached.lock().is_none());
    assert!(session.active_stream().await.is_none());
}

#[tokio::test]
async fn test_switch_facing_never_accumulates_streams() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, _sink) = create_session(device.clone());

    session.start(FacingMode::Environment).await.unwrap();

    for n in 1..=5 {
        session.switch_facing().await.unwrap();
        assert_eq!(device.live_stream_count(), 1);

        let expected = if n % 2 == 1 {
            FacingMode::User
        } else {
            FacingMode::Environment
        };
        assert_eq!(session.facing().await, expected);
    }

    assert_eq!(device.opened_stream_count(), 6);
    assert_eq!(session.phase(), CameraPhase::Live);
}

#[tokio::test]
async fn test_capture_keeps_stream_open() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, _sink) = create_session(device.clone());

    let info = session.start(FacingMode::Environment).await.unwrap();
    let image = session.capture().await.unwrap();

    assert_eq!(session.phase(), CameraPhase::Previewing);
    assert_eq!(device.live_stream_count(), 1);
    assert_eq!(session.active_stream().await.map(|s| s.id), Some(info.id));

    assert_eq!(image.mime(), Some("image/jpeg"));
    assert_eq!(image.filename(), CAPTURED_FILENAME);
    assert_eq!((image.width(), image.height()), (64, 48));
    assert!(image.data_url().starts_with("data:image/jpeg;base64,"));
    assert_eq!(session.captured_image().await, Some(image));
}

#[tokio::test]
async fn test_capture_uses_native_resolution_when_smaller_than_ideal() {
    let device = Arc::new(SyntheticCamera::new().native_resolution(32, 24));
    let (session, _sink) = create_session(device);

    session.start(FacingMode::User).await.unwrap();
    let image = session.capture().await.unwrap();

    assert_eq!((image.width(), image.height()), (32, 24));
}

#[tokio::test]
async fn test_retake_returns_to_live_with_fresh_stream() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, _sink) = create_session(device.clone());

    let first = session.start(FacingMode::Environment).await.unwrap();
    session.capture().await.unwrap();

    let second = session.retake().await.unwrap();

    assert_eq!(session.phase(), CameraPhase::Live);
    assert_ne!(first.id, second.id);
    assert_eq!(second.facing, FacingMode::Environment);
    assert_eq!(device.live_stream_count(), 1);
    assert!(session.captured_image().await.is_none());
}

#[tokio::test]
async fn test_capture_requires_live_stream() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, _sink) = create_session(device);

    assert_eq!(session.capture().await, Err(CameraError::NotActive));

    session.start(FacingMode::Environment).await.unwrap();
    session.stop().await;
    assert_eq!(session.capture().await, Err(CameraError::NotActive));
    assert_eq!(session.phase(), CameraPhase::Idle);
}

#[tokio::test]
async fn test_capture_before_first_frame() {
    let device = Arc::new(SyntheticCamera::new().without_frames());
    let (session, _sink) = create_session(device);

    session.start(FacingMode::Environment).await.unwrap();
    assert_eq!(session.capture().await, Err(CameraError::FrameNotReady));
    assert_eq!(session.phase(), CameraPhase::Live);
}

#[tokio::test]
async fn test_rear_camera_falls_back_to_front() {
    let device = Arc::new(SyntheticCamera::with_facings(&[FacingMode::User]));
    let (session, _sink) = create_session(device.clone());

    let info = session.start(FacingMode::Environment).await.unwrap();

    assert_eq!(info.facing, FacingMode::User);
    assert_eq!(session.facing().await, FacingMode::User);
    assert_eq!(
        device.requested_facings(),
        vec![FacingMode::Environment, FacingMode::User]
    );
}

#[tokio::test]
async fn test_fallback_can_be_disabled() {
    let device = Arc::new(SyntheticCamera::with_facings(&[FacingMode::User]));
    let session = CameraSessionBuilder::new()
        .device(device.clone())
        .policy(small_policy())
        .without_front_fallback()
        .build()
        .unwrap();

    let result = session.start(FacingMode::Environment).await;

    assert_eq!(
        result,
        Err(CameraError::DeviceNotFound {
            facing: FacingMode::Environment
        })
    );
    assert_eq!(device.requested_facings(), vec![FacingMode::Environment]);
    assert_eq!(session.phase(), CameraPhase::Idle);
}

#[tokio::test]
async fn test_front_camera_not_found_is_not_retried() {
    let device = Arc::new(SyntheticCamera::with_facings(&[FacingMode::Environment]));
    let (session, _sink) = create_session(device.clone());

    let result = session.start(FacingMode::User).await;

    assert_eq!(
        result,
        Err(CameraError::DeviceNotFound {
            facing: FacingMode::User
        })
    );
    assert_eq!(device.requested_facings().len(), 1);
}

#[tokio::test]
async fn test_device_errors_are_mapped() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, _sink) = create_session(device.clone());

    device.fail_next(DeviceAccessError::NotAllowed);
    assert_eq!(
        session.start(FacingMode::Environment).await,
        Err(CameraError::PermissionDenied)
    );

    device.fail_next(DeviceAccessError::NotReadable("in use".to_string()));
    assert!(matches!(
        session.start(FacingMode::Environment).await,
        Err(CameraError::DeviceBusy { .. })
    ));

    device.fail_next(DeviceAccessError::Overconstrained {
        constraint: "width".to_string(),
    });
    assert!(matches!(
        session.start(FacingMode::Environment).await,
        Err(CameraError::ConstraintsUnsatisfiable { .. })
    ));

    let invalid = DeviceAccessError::from_name("TypeError", "empty constraints");
    device.fail_next(invalid);
    assert!(matches!(
        session.start(FacingMode::Environment).await,
        Err(CameraError::InvalidConstraints { .. })
    ));

    assert_eq!(session.phase(), CameraPhase::Idle);
    assert_eq!(device.live_stream_count(), 0);

    // Failures are recoverable by retrying
    session.start(FacingMode::Environment).await.unwrap();
    assert_eq!(session.phase(), CameraPhase::Live);
}

#[tokio::test]
async fn test_failed_switch_leaves_no_stream() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, _sink) = create_session(device.clone());

    session.start(FacingMode::Environment).await.unwrap();
    device.fail_next(DeviceAccessError::NotAllowed);

    assert_eq!(
        session.switch_facing().await,
        Err(CameraError::PermissionDenied)
    );
    assert_eq!(device.live_stream_count(), 0);
    assert_eq!(session.phase(), CameraPhase::Idle);
}

#[tokio::test]
async fn test_destroy_twice_releases_everything() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, sink) = create_session(device.clone());

    session.start(FacingMode::Environment).await.unwrap();
    session.capture().await.unwrap();

    session.destroy().await;
    session.destroy().await;

    assert!(session.is_closed());
    assert_eq!(device.live_stream_count(), 0);
    assert!(sink.attached.lock().is_none());
    assert!(session.captured_image().await.is_none());
    assert_eq!(
        session.start(FacingMode::Environment).await,
        Err(CameraError::SessionClosed)
    );
}

#[tokio::test]
async fn test_grant_completing_after_destroy_is_discarded() {
    let delay = Duration::from_millis(50);
    let device = Arc::new(SyntheticCamera::new().grant_delay(delay));
    let (session, sink) = create_session(device.clone());

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.start(FacingMode::Environment).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(session.is_busy());
    session.destroy().await;

    assert_eq!(pending.await.unwrap(), Err(CameraError::SessionClosed));
    assert_eq!(device.live_stream_count(), 0);
    assert_eq!(device.opened_stream_count(), 1);
    assert_eq!(*sink.attach_count.lock(), 0);
    assert_eq!(session.phase(), CameraPhase::Idle);
}

#[tokio::test]
async fn test_missing_camera_answered_after_destroy_reports_closed() {
    let device = SyntheticCamera::with_facings(&[FacingMode::User]);
    let device = Arc::new(device.grant_delay(Duration::from_millis(50)));
    let (session, _sink) = create_session(device.clone());

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.start(FacingMode::Environment).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    session.destroy().await;

    assert_eq!(pending.await.unwrap(), Err(CameraError::SessionClosed));
    assert_eq!(device.requested_facings(), vec![FacingMode::Environment]);
    assert_eq!(device.live_stream_count(), 0);
    assert_eq!(session.phase(), CameraPhase::Idle);
}

#[test]
fn test_recoverability() {
    assert!(CameraError::PermissionDenied.is_recoverable());
    assert!(CameraError::FrameNotReady.is_recoverable());
    assert!(!CameraError::SessionClosed.is_recoverable());
    assert!(!GeolocationError::Unsupported.is_recoverable());
    assert!(GeolocationError::Timeout.is_recoverable());
    assert!(SubmissionError::NetworkUnavailable.is_recoverable());
    assert!(!SubmissionError::Unauthenticated.is_recoverable());
    assert!(PhotoError::EmptyImage.is_recoverable());
}

#[tokio::test]
async fn test_phase_transitions_are_observable() {
    let device = Arc::new(SyntheticCamera::new());
    let (session, _sink) = create_session(device);
    let mut phases = session.subscribe();

    session.start(FacingMode::Environment).await.unwrap();
    assert!(phases.has_changed().unwrap());
    assert_eq!(*phases.borrow_and_update(), CameraPhase::Live);

    session.capture().await.unwrap();
    assert_eq!(*phases.borrow_and_update(), CameraPhase::Previewing);
}

#[test]
fn test_builder_validation() {
    let result = CameraSessionBuilder::new().build();

    match result {
        Err(StorycamError::System { message }) => {
            assert!(message.contains("Camera device must be specified"));
        }
        _ => panic!("Expected system error for missing device"),
    }
}

#[test]
fn test_facing_mode_parsing() {
    assert_eq!(
        "environment".parse::<FacingMode>(),
        Ok(FacingMode::Environment)
    );
    assert_eq!("Front".parse::<FacingMode>(), Ok(FacingMode::User));
    assert!("sideways".parse::<FacingMode>().is_err());
    assert_eq!(FacingMode::User.toggled(), FacingMode::Environment);
}

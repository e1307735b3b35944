use super::*;
use crate::config::{CameraConfig, DetectorConfig, IngestConfig, QueuePolicy};
use crate::detector::MotionDetector;
use crate::error::WatchcamError;
use crate::events::EventBus;
use crate::frame::FrameFormat;
use crate::ingest::FrameIngestWorker;

use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn sizes(list: &[(u32, u32)]) -> Vec<Size> {
    list.iter().map(|&(w, h)| Size::new(w, h)).collect()
}

#[test]
fn test_select_exact_ratio() {
    let selected = select_preview_size(&sizes(&[(100, 200)]), 50, 100).unwrap();
    assert_eq!(selected, Size::new(100, 200));
}

#[test]
fn test_select_empty_candidates() {
    assert!(matches!(
        select_preview_size(&[], 640, 480),
        Err(WatchcamError::NoCandidates)
    ));
}

#[test]
fn test_select_prefers_aspect_match_over_closer_height() {
    // Target ratio 480/800 = 0.6: 300x500 (0.6) matches, 1280x480 (2.67) does not
    let candidates = sizes(&[(1280, 480), (300, 500), (240, 400)]);
    assert_eq!(
        select_preview_size(&candidates, 800, 480).unwrap(),
        Size::new(300, 500)
    );
}

#[test]
fn test_select_falls_back_to_closest_height() {
    let candidates = sizes(&[(1920, 1080), (1280, 720), (640, 480)]);
    // Target ratio 1080/1920 = 0.5625, no candidate's width/height is close
    assert_eq!(
        select_preview_size(&candidates, 1920, 1080).unwrap(),
        Size::new(1920, 1080)
    );
    assert_eq!(
        select_preview_size(&candidates, 1000, 700).unwrap(),
        Size::new(1280, 720)
    );
}

#[test]
fn test_select_ties_keep_first_candidate() {
    let candidates = sizes(&[(640, 500), (800, 460), (320, 480)]);
    // No aspect match for a 4.8 target ratio, so every candidate is considered
    assert_eq!(
        select_preview_size(&candidates, 100, 480).unwrap(),
        Size::new(320, 480)
    );

    let tied = sizes(&[(640, 500), (800, 460)]);
    assert_eq!(
        select_preview_size(&tied, 100, 480).unwrap(),
        Size::new(640, 500)
    );
}

#[test]
fn test_orientation_back_camera() {
    assert_eq!(compute_orientation(90, Facing::Back, Rotation::Rotation0), 90);
    assert_eq!(compute_orientation(90, Facing::Back, Rotation::Rotation90), 0);
    assert_eq!(compute_orientation(90, Facing::Back, Rotation::Rotation180), 270);
    assert_eq!(compute_orientation(0, Facing::Back, Rotation::Rotation270), 90);
}

#[test]
fn test_orientation_front_camera_is_mirrored() {
    assert_eq!(compute_orientation(90, Facing::Front, Rotation::Rotation0), 270);
    assert_eq!(compute_orientation(270, Facing::Front, Rotation::Rotation90), 0);
    assert_eq!(compute_orientation(270, Facing::Front, Rotation::Rotation0), 90);
    assert_eq!(compute_orientation(0, Facing::Front, Rotation::Rotation0), 0);
}

#[test]
fn test_orientation_result_in_range() {
    let rotations = [
        Rotation::Rotation0,
        Rotation::Rotation90,
        Rotation::Rotation180,
        Rotation::Rotation270,
    ];
    for sensor in (0..720).step_by(90) {
        for rotation in rotations {
            for facing in [Facing::Front, Facing::Back] {
                assert!(compute_orientation(sensor, facing, rotation) < 360);
            }
        }
    }
}

#[test]
fn test_rotation_from_degrees() {
    assert_eq!(Rotation::from_degrees(180).unwrap(), Rotation::Rotation180);
    assert_eq!(Rotation::Rotation270.degrees(), 270);
    assert!(matches!(
        Rotation::from_degrees(45),
        Err(WatchcamError::InvalidRotationAngle { degrees: 45 })
    ));
}

#[test]
fn test_fps_range_pins_slowest_minimum() {
    let ranges = [
        FpsRange { min: 15000, max: 30000 },
        FpsRange { min: 7000, max: 15000 },
    ];
    assert_eq!(
        select_fps_range(&ranges),
        Some(FpsRange { min: 7000, max: 7000 })
    );
    assert_eq!(select_fps_range(&[]), None);
}

#[test]
fn test_camera_setup_configures_surface() {
    let setup = CameraSetup::new(CameraCapabilities {
        facing: Facing::Back,
        sensor_orientation: 90,
        preview_sizes: sizes(&[(1280, 720), (640, 480), (320, 240)]),
        fps_ranges: vec![FpsRange { min: 10000, max: 30000 }],
    });

    let settings = setup
        .configure(SurfaceInfo {
            width: 480,
            height: 640,
            rotation: Rotation::Rotation0,
        })
        .unwrap();

    assert_eq!(settings.display_orientation, 90);
    // Surface ratio 640/480 matches the 4:3 candidates; 480 is the closer height
    assert_eq!(settings.preview_size, Size::new(640, 480));
    assert_eq!(settings.preview_format, FrameFormat::Nv21);
    assert_eq!(
        settings.fps_range,
        Some(FpsRange { min: 10000, max: 10000 })
    );
}

#[test]
fn test_camera_setup_without_sizes_fails() {
    let setup = CameraSetup::new(CameraCapabilities {
        facing: Facing::Front,
        sensor_orientation: 270,
        preview_sizes: Vec::new(),
        fps_ranges: Vec::new(),
    });

    let result = setup.configure(SurfaceInfo {
        width: 480,
        height: 640,
        rotation: Rotation::Rotation90,
    });
    assert!(matches!(result, Err(WatchcamError::NoCandidates)));
}

fn replay_config(path: &std::path::Path) -> CameraConfig {
    CameraConfig {
        index: 0,
        resolution: (4, 4),
        fps: 200,
        replay_path: Some(path.to_string_lossy().into_owned()),
        replay_loop: false,
    }
}

#[tokio::test]
async fn test_replay_source_submits_every_frame() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    // Three 4x4 NV21 frames plus a partial trailing frame
    for value in [0u8, 10, 20] {
        file.write_all(&[value; 24]).unwrap();
    }
    file.write_all(&[0u8; 5]).unwrap();
    file.flush().unwrap();

    let config = replay_config(file.path());
    let source = ReplaySource::from_config(&config).unwrap();
    assert_eq!(source.frame_len(), 24);
    let stats = source.stats();

    let event_bus = Arc::new(EventBus::new(16));
    let detector = MotionDetector::new(DetectorConfig::default());
    let worker = FrameIngestWorker::new(
        &IngestConfig {
            queue_policy: QueuePolicy::Unbounded,
            queue_capacity: 0,
        },
        detector,
        event_bus,
    );

    let task = source.start(worker.handle(), CancellationToken::new());
    let frames = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(frames, 3);
    assert_eq!(stats.frames_submitted.load(Ordering::Relaxed), 3);
    assert_eq!(worker.handle().queue_len(), 3);
}

#[tokio::test]
async fn test_replay_source_stops_on_cancel() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[1u8; 24]).unwrap();
    file.flush().unwrap();

    let mut config = replay_config(file.path());
    config.replay_loop = true;
    let source = ReplaySource::new(file.path(), &config);

    let event_bus = Arc::new(EventBus::new(16));
    let worker = FrameIngestWorker::new(
        &IngestConfig {
            queue_policy: QueuePolicy::DropOldest,
            queue_capacity: 2,
        },
        MotionDetector::new(DetectorConfig::default()),
        event_bus,
    );

    let cancel = CancellationToken::new();
    let task = source.start(worker.handle(), cancel.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let frames = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(frames >= 1);
    assert!(worker.handle().queue_len() <= 2);
}

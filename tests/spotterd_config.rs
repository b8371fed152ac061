use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use spotter::config::SpotterConfig;
use spotter::display::DisplayMode;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SPOTTER_CONFIG",
        "SPOTTER_DISPLAY",
        "SPOTTER_CAMERA",
        "SPOTTER_MODEL",
        "SPOTTER_DETECTION_INTERVAL",
        "SPOTTER_MAX_FRAMES",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SpotterConfig::load().expect("load defaults");
    assert_eq!(cfg.display, DisplayMode::Console);
    assert_eq!(cfg.camera.device, "stub://bench");
    assert_eq!(cfg.camera.width, 640);
    assert_eq!(cfg.camera.height, 480);
    assert_eq!(cfg.detection.interval, 5);
    assert_eq!(cfg.detection.confidence_threshold, 0.5);
    assert_eq!(cfg.detection.iou_threshold, 0.45);
    assert_eq!(cfg.oled.address, 0x3c);
    assert_eq!(cfg.tft.dc_pin, 24);
    assert!(cfg.detection.model_path.is_none());
    assert!(cfg.max_frames.is_none());
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "display": "window",
        "camera": {
            "device": "/dev/video2",
            "target_fps": 15,
            "width": 800,
            "height": 600
        },
        "detection": {
            "model_path": "models/yolo11n.onnx",
            "interval": 10,
            "confidence_threshold": 0.6,
            "iou_threshold": 0.4
        },
        "oled": { "i2c_bus": "/dev/i2c-3", "address": 61 },
        "max_frames": 200
    }"#;
    file.write_all(json.as_bytes()).expect("write config");

    std::env::set_var("SPOTTER_CONFIG", file.path());
    std::env::set_var("SPOTTER_DISPLAY", "console");
    std::env::set_var("SPOTTER_DETECTION_INTERVAL", "7");

    let cfg = SpotterConfig::load().expect("load config");

    // File values survive where no env override exists.
    assert_eq!(cfg.camera.device, "/dev/video2");
    assert_eq!(cfg.camera.target_fps, 15);
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(
        cfg.detection.model_path.as_deref(),
        Some(std::path::Path::new("models/yolo11n.onnx"))
    );
    assert_eq!(cfg.detection.confidence_threshold, 0.6);
    assert_eq!(cfg.oled.i2c_bus, "/dev/i2c-3");
    assert_eq!(cfg.oled.address, 61);
    assert_eq!(cfg.max_frames, Some(200));

    // Env overrides file.
    assert_eq!(cfg.display, DisplayMode::Console);
    assert_eq!(cfg.detection.interval, 7);

    clear_env();
}

#[test]
fn zero_detection_interval_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SPOTTER_DETECTION_INTERVAL", "0");
    assert!(SpotterConfig::load().is_err());
    clear_env();
}

#[test]
fn out_of_range_confidence_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(br#"{ "detection": { "confidence_threshold": 1.5 } }"#)
        .expect("write config");
    std::env::set_var("SPOTTER_CONFIG", file.path());

    assert!(SpotterConfig::load().is_err());
    clear_env();
}

#[test]
fn unknown_display_mode_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SPOTTER_DISPLAY", "hologram");
    assert!(SpotterConfig::load().is_err());
    clear_env();
}

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::display::DisplayMode;

const DEFAULT_CAMERA_DEVICE: &str = "stub://bench";
const DEFAULT_CAMERA_FPS: u32 = 10;
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_DETECTION_INTERVAL: u32 = 5;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
const DEFAULT_MODEL_INPUT_SIZE: u32 = 640;
const DEFAULT_OLED_BUS: &str = "/dev/i2c-1";
const DEFAULT_OLED_ADDRESS: u8 = 0x3c;
const DEFAULT_TFT_SPI_DEVICE: &str = "/dev/spidev0.0";
const DEFAULT_TFT_GPIO_CHIP: &str = "/dev/gpiochip0";
const DEFAULT_TFT_DC_PIN: u32 = 24;
const DEFAULT_TFT_RESET_PIN: u32 = 25;
const DEFAULT_TFT_WIDTH: u32 = 320;
const DEFAULT_TFT_HEIGHT: u32 = 240;

#[derive(Debug, Deserialize, Default)]
struct SpotterConfigFile {
    display: Option<String>,
    camera: Option<CameraConfigFile>,
    detection: Option<DetectionConfigFile>,
    oled: Option<OledConfigFile>,
    tft: Option<TftConfigFile>,
    max_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    interval: Option<u32>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct OledConfigFile {
    i2c_bus: Option<String>,
    address: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct TftConfigFile {
    spi_device: Option<String>,
    gpio_chip: Option<String>,
    dc_pin: Option<u32>,
    reset_pin: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SpotterConfig {
    pub display: DisplayMode,
    pub camera: CameraSettings,
    pub detection: DetectionSettings,
    pub oled: OledSettings,
    pub tft: TftSettings,
    /// Stop after this many frames (bench/demo runs). None = run until
    /// interrupted.
    pub max_frames: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct DetectionSettings {
    /// ONNX model path. None selects the stub scene-change detector.
    pub model_path: Option<PathBuf>,
    pub input_size: u32,
    /// Frames between successive detector invocations.
    pub interval: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
}

#[derive(Debug, Clone)]
pub struct OledSettings {
    pub i2c_bus: String,
    pub address: u8,
}

#[derive(Debug, Clone)]
pub struct TftSettings {
    pub spi_device: String,
    pub gpio_chip: String,
    pub dc_pin: u32,
    pub reset_pin: u32,
    pub width: u32,
    pub height: u32,
}

impl SpotterConfig {
    /// Load configuration: file named by `SPOTTER_CONFIG` (if any), then env
    /// overrides, then validation.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SPOTTER_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Same as `load`, but with an explicit config file path (CLI `--config`).
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => match std::env::var("SPOTTER_CONFIG").ok() {
                Some(path) => Some(read_config_file(Path::new(&path))?),
                None => None,
            },
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SpotterConfigFile) -> Result<Self> {
        let display = match file.display.as_deref() {
            Some(mode) => mode.parse()?,
            None => DisplayMode::Console,
        };
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_CAMERA_FPS),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
        };
        let detection = DetectionSettings {
            model_path: file
                .detection
                .as_ref()
                .and_then(|detection| detection.model_path.clone()),
            input_size: file
                .detection
                .as_ref()
                .and_then(|detection| detection.input_size)
                .unwrap_or(DEFAULT_MODEL_INPUT_SIZE),
            interval: file
                .detection
                .as_ref()
                .and_then(|detection| detection.interval)
                .unwrap_or(DEFAULT_DETECTION_INTERVAL),
            confidence_threshold: file
                .detection
                .as_ref()
                .and_then(|detection| detection.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
            iou_threshold: file
                .detection
                .as_ref()
                .and_then(|detection| detection.iou_threshold)
                .unwrap_or(DEFAULT_IOU_THRESHOLD),
        };
        let oled = OledSettings {
            i2c_bus: file
                .oled
                .as_ref()
                .and_then(|oled| oled.i2c_bus.clone())
                .unwrap_or_else(|| DEFAULT_OLED_BUS.to_string()),
            address: file
                .oled
                .as_ref()
                .and_then(|oled| oled.address)
                .unwrap_or(DEFAULT_OLED_ADDRESS),
        };
        let tft = TftSettings {
            spi_device: file
                .tft
                .as_ref()
                .and_then(|tft| tft.spi_device.clone())
                .unwrap_or_else(|| DEFAULT_TFT_SPI_DEVICE.to_string()),
            gpio_chip: file
                .tft
                .as_ref()
                .and_then(|tft| tft.gpio_chip.clone())
                .unwrap_or_else(|| DEFAULT_TFT_GPIO_CHIP.to_string()),
            dc_pin: file
                .tft
                .as_ref()
                .and_then(|tft| tft.dc_pin)
                .unwrap_or(DEFAULT_TFT_DC_PIN),
            reset_pin: file
                .tft
                .as_ref()
                .and_then(|tft| tft.reset_pin)
                .unwrap_or(DEFAULT_TFT_RESET_PIN),
            width: file
                .tft
                .as_ref()
                .and_then(|tft| tft.width)
                .unwrap_or(DEFAULT_TFT_WIDTH),
            height: file
                .tft
                .and_then(|tft| tft.height)
                .unwrap_or(DEFAULT_TFT_HEIGHT),
        };
        Ok(Self {
            display,
            camera,
            detection,
            oled,
            tft,
            max_frames: file.max_frames,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(mode) = std::env::var("SPOTTER_DISPLAY") {
            if !mode.trim().is_empty() {
                self.display = mode.parse()?;
            }
        }
        if let Ok(device) = std::env::var("SPOTTER_CAMERA") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(model) = std::env::var("SPOTTER_MODEL") {
            if !model.trim().is_empty() {
                self.detection.model_path = Some(PathBuf::from(model));
            }
        }
        if let Ok(interval) = std::env::var("SPOTTER_DETECTION_INTERVAL") {
            let parsed: u32 = interval
                .parse()
                .map_err(|_| anyhow!("SPOTTER_DETECTION_INTERVAL must be a positive integer"))?;
            self.detection.interval = parsed;
        }
        if let Ok(max_frames) = std::env::var("SPOTTER_MAX_FRAMES") {
            let parsed: u64 = max_frames
                .parse()
                .map_err(|_| anyhow!("SPOTTER_MAX_FRAMES must be an integer frame count"))?;
            self.max_frames = Some(parsed);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.detection.interval == 0 {
            return Err(anyhow!("detection interval must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            return Err(anyhow!("confidence threshold must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.detection.iou_threshold) {
            return Err(anyhow!("iou threshold must be within [0, 1]"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be nonzero"));
        }
        if self.detection.input_size == 0 {
            return Err(anyhow!("model input size must be nonzero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SpotterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

//! Display backends.
//!
//! One backend is selected at startup and never changes within a run. The
//! dispatch is a plain tagged variant with a single capability: `present` a
//! frame plus the current detection report. Hardware backends are
//! feature-gated; selecting a mode that was not compiled in fails at open
//! time with a descriptive error.

mod console;
#[cfg(feature = "display-oled")]
mod oled;
#[cfg(feature = "display-tft")]
mod tft;
#[cfg(feature = "display-window")]
mod window;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use crate::config::SpotterConfig;
use crate::detect::Detection;
use crate::frame::Frame;

pub use console::ConsoleDisplay;
#[cfg(feature = "display-oled")]
pub use oled::OledDisplay;
#[cfg(feature = "display-tft")]
pub use tft::TftDisplay;
#[cfg(feature = "display-window")]
pub use window::WindowDisplay;

/// The display target chosen at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Console,
    Window,
    Oled,
    Tft,
}

impl FromStr for DisplayMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" => Ok(DisplayMode::Console),
            "window" => Ok(DisplayMode::Window),
            "oled" => Ok(DisplayMode::Oled),
            "tft" => Ok(DisplayMode::Tft),
            other => Err(anyhow::anyhow!(
                "unknown display mode '{}' (expected console, window, oled, or tft)",
                other
            )),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayMode::Console => "console",
            DisplayMode::Window => "window",
            DisplayMode::Oled => "oled",
            DisplayMode::Tft => "tft",
        };
        f.write_str(name)
    }
}

/// Whether the backend is still accepting frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayStatus {
    Active,
    /// The user closed the surface (window close button, Escape); the loop
    /// treats this as a cooperative stop.
    Closed,
}

/// What the loop hands a backend each iteration.
#[derive(Clone, Copy, Debug)]
pub struct FrameReport<'a> {
    /// 0-based index of the frame being presented.
    pub frame_index: u64,
    /// Cached detections, descending confidence.
    pub detections: &'a [Detection],
    /// Rolling frames-per-second estimate.
    pub fps: f64,
}

/// The active display backend.
pub enum DisplayBackend {
    Console(ConsoleDisplay),
    #[cfg(feature = "display-window")]
    Window(WindowDisplay),
    #[cfg(feature = "display-oled")]
    Oled(OledDisplay),
    #[cfg(feature = "display-tft")]
    Tft(TftDisplay),
    #[cfg(test)]
    Recorder(RecorderDisplay),
}

impl DisplayBackend {
    /// Open the backend for `mode`, failing when the required feature was not
    /// compiled in.
    pub fn open(mode: DisplayMode, config: &SpotterConfig) -> Result<Self> {
        match mode {
            DisplayMode::Console => Ok(DisplayBackend::Console(ConsoleDisplay::stdout())),
            DisplayMode::Window => {
                #[cfg(feature = "display-window")]
                {
                    Ok(DisplayBackend::Window(WindowDisplay::open(
                        config.camera.width,
                        config.camera.height,
                    )?))
                }
                #[cfg(not(feature = "display-window"))]
                {
                    let _ = config;
                    Err(anyhow::anyhow!(
                        "windowed display requires the display-window feature"
                    ))
                }
            }
            DisplayMode::Oled => {
                #[cfg(feature = "display-oled")]
                {
                    Ok(DisplayBackend::Oled(OledDisplay::open(&config.oled)?))
                }
                #[cfg(not(feature = "display-oled"))]
                {
                    let _ = config;
                    Err(anyhow::anyhow!("OLED display requires the display-oled feature"))
                }
            }
            DisplayMode::Tft => {
                #[cfg(feature = "display-tft")]
                {
                    Ok(DisplayBackend::Tft(TftDisplay::open(&config.tft)?))
                }
                #[cfg(not(feature = "display-tft"))]
                {
                    let _ = config;
                    Err(anyhow::anyhow!("TFT display requires the display-tft feature"))
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DisplayBackend::Console(_) => "console",
            #[cfg(feature = "display-window")]
            DisplayBackend::Window(_) => "window",
            #[cfg(feature = "display-oled")]
            DisplayBackend::Oled(_) => "oled",
            #[cfg(feature = "display-tft")]
            DisplayBackend::Tft(_) => "tft",
            #[cfg(test)]
            DisplayBackend::Recorder(_) => "recorder",
        }
    }

    /// Present one frame with its detection report.
    pub fn present(&mut self, frame: &Frame, report: &FrameReport<'_>) -> Result<DisplayStatus> {
        match self {
            DisplayBackend::Console(display) => display.present(frame, report),
            #[cfg(feature = "display-window")]
            DisplayBackend::Window(display) => display.present(frame, report),
            #[cfg(feature = "display-oled")]
            DisplayBackend::Oled(display) => display.present(frame, report),
            #[cfg(feature = "display-tft")]
            DisplayBackend::Tft(display) => display.present(frame, report),
            #[cfg(test)]
            DisplayBackend::Recorder(display) => display.present(frame, report),
        }
    }
}

/// Test scaffold: records every presented report and can inject write
/// failures on chosen frames.
#[cfg(test)]
pub struct RecorderDisplay {
    pub presented: Vec<(u64, Vec<Detection>, f64)>,
    pub fail_on: Vec<u64>,
}

#[cfg(test)]
impl RecorderDisplay {
    pub fn new() -> Self {
        Self {
            presented: Vec::new(),
            fail_on: Vec::new(),
        }
    }

    fn present(&mut self, _frame: &Frame, report: &FrameReport<'_>) -> Result<DisplayStatus> {
        if self.fail_on.contains(&report.frame_index) {
            return Err(anyhow::anyhow!("injected display failure"));
        }
        self.presented
            .push((report.frame_index, report.detections.to_vec(), report.fps));
        Ok(DisplayStatus::Active)
    }
}

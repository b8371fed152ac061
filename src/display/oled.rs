#![cfg(feature = "display-oled")]

use anyhow::{anyhow, Context, Result};
use embedded_graphics::{
    mono_font::{ascii::FONT_5X8, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::Text,
};
use linux_embedded_hal::I2cdev;
use ssd1306::{mode::BufferedGraphicsMode, prelude::*, I2CDisplayInterface, Ssd1306};

use crate::config::OledSettings;
use crate::display::{DisplayStatus, FrameReport};
use crate::frame::Frame;
use crate::overlay::panel_lines;

/// Entries shown on the 128x64 panel; the count line reports the full total.
const MAX_PANEL_ENTRIES: usize = 3;

type Panel =
    Ssd1306<I2CInterface<I2cdev>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

/// I2C SSD1306 backend: renders the text summary on a 128x64 panel.
pub struct OledDisplay {
    panel: Panel,
}

impl OledDisplay {
    pub fn open(settings: &OledSettings) -> Result<Self> {
        let i2c = I2cdev::new(&settings.i2c_bus)
            .with_context(|| format!("open i2c bus {}", settings.i2c_bus))?;
        let interface = I2CDisplayInterface::new_custom_address(i2c, settings.address);
        let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        panel
            .init()
            .map_err(|err| anyhow!("oled init failed: {:?}", err))?;

        log::info!(
            "OledDisplay: initialized 128x64 panel at {} address 0x{:02x}",
            settings.i2c_bus,
            settings.address
        );
        Ok(Self { panel })
    }

    pub(crate) fn present(
        &mut self,
        _frame: &Frame,
        report: &FrameReport<'_>,
    ) -> Result<DisplayStatus> {
        self.panel.clear(BinaryColor::Off).ok();

        let style = MonoTextStyle::new(&FONT_5X8, BinaryColor::On);
        let lines = panel_lines(
            report.frame_index,
            report.detections,
            report.fps,
            MAX_PANEL_ENTRIES,
        );
        for (i, line) in lines.iter().enumerate() {
            let _ = Text::new(line, Point::new(2, 8 + (i as i32) * 10), style)
                .draw(&mut self.panel);
        }

        self.panel
            .flush()
            .map_err(|err| anyhow!("oled flush failed: {:?}", err))?;
        Ok(DisplayStatus::Active)
    }
}

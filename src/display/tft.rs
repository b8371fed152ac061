#![cfg(feature = "display-tft")]

use anyhow::{anyhow, Context, Result};
use display_interface_spi::SPIInterface;
use embedded_graphics::{
    pixelcolor::{Rgb565, Rgb888},
    prelude::*,
};
use gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};
use mipidsi::{models::ST7789, Builder};

use crate::config::TftSettings;
use crate::display::{DisplayStatus, FrameReport};
use crate::frame::Frame;
use crate::overlay::annotate;

const SPI_SPEED_HZ: u32 = 40_000_000;

type Panel = mipidsi::Display<SPIInterface<SpidevDevice, CdevPin>, ST7789, CdevPin>;

/// SPI ST7789 backend: shows the annotated frame scaled to the panel.
pub struct TftDisplay {
    panel: Panel,
    width: u32,
    height: u32,
}

impl TftDisplay {
    pub fn open(settings: &TftSettings) -> Result<Self> {
        let mut spi = SpidevDevice::open(&settings.spi_device)
            .with_context(|| format!("open spi device {}", settings.spi_device))?;
        spi.0
            .configure(
                &SpidevOptions::new()
                    .bits_per_word(8)
                    .max_speed_hz(SPI_SPEED_HZ)
                    .mode(SpiModeFlags::SPI_MODE_0)
                    .build(),
            )
            .context("configure spi device")?;

        let mut chip = Chip::new(&settings.gpio_chip)
            .with_context(|| format!("open gpio chip {}", settings.gpio_chip))?;
        let dc = CdevPin::new(
            chip.get_line(settings.dc_pin)
                .context("request dc line")?
                .request(LineRequestFlags::OUTPUT, 0, "spotter-dc")
                .context("request dc output")?,
        )
        .context("wrap dc pin")?;
        let rst = CdevPin::new(
            chip.get_line(settings.reset_pin)
                .context("request reset line")?
                .request(LineRequestFlags::OUTPUT, 0, "spotter-rst")
                .context("request reset output")?,
        )
        .context("wrap reset pin")?;

        let interface = SPIInterface::new(spi, dc);
        let panel = Builder::new(ST7789, interface)
            .display_size(settings.width as u16, settings.height as u16)
            .reset_pin(rst)
            .init(&mut Delay)
            .map_err(|err| anyhow!("tft init failed: {:?}", err))?;

        log::info!(
            "TftDisplay: initialized {}x{} panel on {}",
            settings.width,
            settings.height,
            settings.spi_device
        );
        Ok(Self {
            panel,
            width: settings.width,
            height: settings.height,
        })
    }

    pub(crate) fn present(
        &mut self,
        frame: &Frame,
        report: &FrameReport<'_>,
    ) -> Result<DisplayStatus> {
        let annotated = annotate(frame, report.detections);
        let scaled = image::imageops::resize(
            &annotated,
            self.width,
            self.height,
            image::imageops::FilterType::Triangle,
        );

        let colors = scaled
            .pixels()
            .map(|px| Rgb565::from(Rgb888::new(px[0], px[1], px[2])));
        self.panel
            .set_pixels(
                0,
                0,
                (self.width - 1) as u16,
                (self.height - 1) as u16,
                colors,
            )
            .map_err(|err| anyhow!("tft write failed: {:?}", err))?;

        Ok(DisplayStatus::Active)
    }
}

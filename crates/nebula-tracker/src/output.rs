//! Frame rendering and the stdout sink.
//!
//! [`FrameRenderer`] holds the static lookup tables and display settings
//! for the lifetime of the process and turns each published forecast into
//! one frame in the configured [`OutputFormat`].

use std::io::Write;

use nebula_core::config::{DisplayConfig, OutputFormat};
use nebula_render::images::ImageTable;
use nebula_render::markers::MarkerTable;
use nebula_render::{text, view};
use nebula_types::Forecast;

use crate::error::TrackerError;

/// ANSI sequence: clear screen, cursor home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Renders forecasts with fixed tables and display settings.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    markers: MarkerTable,
    images: ImageTable,
    display: DisplayConfig,
    clear_between_frames: bool,
}

impl FrameRenderer {
    /// Standard marker coordinates, standard images with `display.images`
    /// applied on top.
    pub fn new(display: DisplayConfig, clear_between_frames: bool) -> Self {
        let images = ImageTable::standard().with_overrides(&display.images);
        Self {
            markers: MarkerTable::standard(),
            images,
            display,
            clear_between_frames,
        }
    }

    /// Render one frame without writing it anywhere.
    pub fn frame(&self, forecast: &Forecast) -> Result<String, TrackerError> {
        let view = view::build(forecast, &self.markers, &self.images, &self.display);
        match self.display.format {
            OutputFormat::Text => Ok(text::render(&view)),
            OutputFormat::Json => Ok(view::to_json(&view)?),
        }
    }

    /// Render one frame and write it to `out`, followed by a newline.
    ///
    /// Text frames are preceded by a screen clear when enabled; JSON frames
    /// are written as one document per line.
    pub fn emit<W: Write>(&self, forecast: &Forecast, out: &mut W) -> Result<(), TrackerError> {
        let frame = self.frame(forecast)?;
        if self.clear_between_frames && self.display.format == OutputFormat::Text {
            out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        writeln!(out, "{frame}")?;
        out.flush()?;
        Ok(())
    }
}

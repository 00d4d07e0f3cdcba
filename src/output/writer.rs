// Artifact files: UTF-8 HTML and PNG with a physical resolution chunk.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};

use crate::render::datamap::Datamap;

const METERS_PER_INCH: f64 = 0.0254;

/// Pixels per meter for a resolution in dots per inch.
pub fn pixels_per_meter(dpi: u32) -> u32 {
    (dpi as f64 / METERS_PER_INCH).round() as u32
}

pub fn write_html(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write the datamap as an RGB PNG whose `pHYs` chunk records its DPI.
pub fn write_png(path: &Path, datamap: &Datamap) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let (width, height) = datamap.image.dimensions();

    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = pixels_per_meter(datamap.dpi);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder
        .write_header()
        .with_context(|| format!("Failed to write PNG header to {}", path.display()))?;
    writer
        .write_image_data(datamap.image.as_raw())
        .with_context(|| format!("Failed to write PNG data to {}", path.display()))?;
    writer
        .finish()
        .with_context(|| format!("Failed to finish {}", path.display()))?;
    Ok(())
}

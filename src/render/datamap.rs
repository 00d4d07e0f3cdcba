// Static datamap — a raster of the document map with topic labels.
//
// The canvas is 10 x 10 inches at 150 DPI. Noise is drawn first in light
// grey, topic points on top in palette colours, then topic labels at the
// centroids. The finished image is cropped to the drawn content plus a small
// pad, the way a tight bounding box save would.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::Result;
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_text_mut, text_size};
use tracing::{debug, warn};

use super::{check_alignment, topic_centroids, topic_color, Viewport};
use crate::topics::{TopicModel, NOISE_TOPIC};

pub const DPI: u32 = 150;
pub const FIGURE_INCHES: u32 = 10;
pub const CANVAS_PX: u32 = DPI * FIGURE_INCHES;

/// Pad kept around the content when cropping (0.1 inch).
pub const CROP_PAD: u32 = DPI / 10;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_COLOR: Rgb<u8> = Rgb([40, 40, 40]);
const TITLE: &str = "Documents and Topics";
const MARGIN: f32 = 80.0;

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A rendered datamap and the resolution it was drawn for.
#[derive(Debug, Clone)]
pub struct Datamap {
    pub image: RgbImage,
    pub dpi: u32,
}

/// Load a TrueType font for labels: the configured path first, then common
/// system locations. `None` means labels will be skipped.
pub fn load_font(configured: Option<&Path>) -> Option<FontVec> {
    let candidates = configured
        .map(Path::to_path_buf)
        .into_iter()
        .chain(FONT_CANDIDATES.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => {
                debug!(path = %path.display(), "Loaded label font");
                return Some(font);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Not a usable font"),
        }
    }
    None
}

fn point_radius(n_points: usize) -> i32 {
    match n_points {
        0..=500 => 6,
        501..=5000 => 4,
        _ => 2,
    }
}

/// Draw the datamap.
pub fn render_datamap(
    model: &TopicModel,
    docs: &[String],
    coords: &[[f32; 2]],
    font: Option<&FontVec>,
) -> Result<Datamap> {
    check_alignment(docs.len(), coords.len(), model.assignments.len())?;

    let mut canvas = RgbImage::from_pixel(CANVAS_PX, CANVAS_PX, BACKGROUND);
    let size = CANVAS_PX as f32;
    let viewport = Viewport::fit(coords, size, size, MARGIN);
    let radius = point_radius(coords.len());

    let noise = coords
        .iter()
        .zip(&model.assignments)
        .filter(|&(_, &t)| t == NOISE_TOPIC);
    let topical = coords
        .iter()
        .zip(&model.assignments)
        .filter(|&(_, &t)| t != NOISE_TOPIC);
    for (p, &topic) in noise.chain(topical) {
        let (x, y) = viewport.project(*p);
        draw_filled_circle_mut(
            &mut canvas,
            (x.round() as i32, y.round() as i32),
            radius,
            Rgb(topic_color(topic)),
        );
    }

    match font {
        Some(font) => {
            let title_scale = PxScale::from(36.0);
            draw_text_mut(&mut canvas, LABEL_COLOR, MARGIN as i32 / 2, 16, title_scale, font, TITLE);

            let label_scale = PxScale::from(26.0);
            for (topic, centroid) in topic_centroids(coords, &model.assignments) {
                let label = model.label(topic);
                let (w, h) = text_size(label_scale, font, &label);
                let (cx, cy) = viewport.project(centroid);
                let x = (cx as i32 - w as i32 / 2).clamp(0, (CANVAS_PX - w.min(CANVAS_PX)) as i32);
                let y = (cy as i32 - h as i32 / 2).clamp(0, (CANVAS_PX - h.min(CANVAS_PX)) as i32);
                draw_text_mut(&mut canvas, LABEL_COLOR, x, y, label_scale, font, &label);
            }
        }
        None => warn!("No TrueType font found; datamap labels skipped (set TOPICMAP_FONT)"),
    }

    Ok(Datamap {
        image: tight_crop(&canvas, BACKGROUND, CROP_PAD),
        dpi: DPI,
    })
}

/// Crop to the smallest box holding every non-background pixel, plus `pad`.
pub fn tight_crop(image: &RgbImage, background: Rgb<u8>, pad: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut min = (u32::MAX, u32::MAX);
    let mut max = (0, 0);
    for (x, y, px) in image.enumerate_pixels() {
        if *px != background {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
    }
    if min.0 == u32::MAX {
        return image.clone();
    }

    let x0 = min.0.saturating_sub(pad);
    let y0 = min.1.saturating_sub(pad);
    let x1 = (max.0 + pad + 1).min(width);
    let y1 = (max.1 + pad + 1).min(height);
    imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::CountVectorizer;

    #[test]
    fn test_canvas_is_ten_inches_at_150_dpi() {
        assert_eq!(CANVAS_PX, 1500);
        assert_eq!(CROP_PAD, 15);
    }

    #[test]
    fn test_tight_crop_keeps_content_and_pad() {
        let mut img = RgbImage::from_pixel(100, 100, BACKGROUND);
        img.put_pixel(40, 50, Rgb([0, 0, 0]));
        img.put_pixel(60, 55, Rgb([0, 0, 0]));
        let cropped = tight_crop(&img, BACKGROUND, 5);
        assert_eq!(cropped.dimensions(), (31, 16));
        assert_eq!(*cropped.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_tight_crop_blank_image_unchanged() {
        let img = RgbImage::from_pixel(10, 10, BACKGROUND);
        assert_eq!(tight_crop(&img, BACKGROUND, 2).dimensions(), (10, 10));
    }

    #[test]
    fn test_render_without_font() {
        let docs: Vec<String> = vec!["alpha beta".into(), "beta gamma".into(), "delta".into()];
        let model = TopicModel::from_assignments(
            &docs,
            &[0, 0, -1],
            &CountVectorizer::without_stop_words(1, 1.0),
        )
        .unwrap();
        let coords = vec![[0.0, 0.0], [1.0, 1.0], [5.0, 0.0]];
        let map = render_datamap(&model, &docs, &coords, None).unwrap();
        assert_eq!(map.dpi, 150);
        let (w, h) = map.image.dimensions();
        assert!(w > 0 && w <= CANVAS_PX);
        assert!(h > 0 && h <= CANVAS_PX);
    }

    #[test]
    fn test_render_rejects_misaligned_input() {
        let docs: Vec<String> = vec!["alpha beta".into(), "beta gamma".into()];
        let model = TopicModel::from_assignments(
            &docs,
            &[0, 0],
            &CountVectorizer::without_stop_words(1, 1.0),
        )
        .unwrap();
        assert!(render_datamap(&model, &docs, &[[0.0, 0.0]], None).is_err());
    }
}

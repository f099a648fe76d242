//! Colour-scale legends composited onto rendered images.

pub mod draw;

use std::path::Path;

use ab_glyph::FontVec;
use image::RgbaImage;
use imageproc::rect::Rect;

use crate::color::Colormap;
use crate::data::model::{ColorbarPosition, Hemisphere, ValueRange};
use crate::error::{PlotError, Result};

/// Ticks drawn when the caller supplies no labels.
pub const DEFAULT_TICKS: usize = 3;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Colorbar rectangle in fractions of the rendered image, origin at the
/// bottom-left corner. `y0` may be negative (below the image).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorbarLayout {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
    /// Tick labels above the bar rather than below it.
    pub ticks_above: bool,
}

/// Bilateral images leave a gap between the hemispheres where a small bar
/// fits; everything else gets a wider bar under the image.
pub fn colorbar_layout(hemisphere: Option<Hemisphere>, position: ColorbarPosition) -> ColorbarLayout {
    match (hemisphere, position) {
        (None, ColorbarPosition::Center) => ColorbarLayout {
            x0: (1.0 - 0.24) / 2.0,
            y0: 0.45,
            width: 0.24,
            height: 0.03,
            ticks_above: true,
        },
        _ => ColorbarLayout {
            x0: 0.3,
            y0: -0.08,
            width: 0.4,
            height: 0.05,
            ticks_above: false,
        },
    }
}

impl ColorbarLayout {
    /// Pixel rectangle for an image of `width` × `height`, in image
    /// coordinates (origin top-left, y down).
    pub fn to_pixels(&self, width: u32, height: u32) -> Rect {
        let (w, h) = (f64::from(width), f64::from(height));
        let left = (self.x0 * w).round() as i32;
        let top = (h - (self.y0 + self.height) * h).round() as i32;
        let bar_w = ((self.width * w).round() as u32).max(2);
        let bar_h = ((self.height * h).round() as u32).max(2);
        Rect::at(left, top).of_size(bar_w, bar_h)
    }
}

// ---------------------------------------------------------------------------
// Ticks
// ---------------------------------------------------------------------------

/// Compact tick labels: enough decimals to tell neighbouring ticks apart,
/// trailing zeros trimmed.
pub fn format_values(values: &[f64]) -> Vec<String> {
    let step = values
        .windows(2)
        .map(|w| (w[1] - w[0]).abs())
        .filter(|s| *s > 0.0)
        .fold(f64::INFINITY, f64::min);
    if step.is_finite() && step < SCIENTIFIC_BELOW {
        let largest = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        let digits = (largest / step).log10().ceil().clamp(0.0, 6.0) as usize;
        return values.iter().map(|&v| format_scientific(v, digits)).collect();
    }
    let decimals = if step.is_finite() {
        ((-step.log10()).ceil() + 1.0).clamp(0.0, 6.0) as usize
    } else {
        2
    };
    values.iter().map(|&v| format_tick(v, decimals)).collect()
}

/// Tick spacing under which fixed-point labels would all collapse to `0`.
const SCIENTIFIC_BELOW: f64 = 1e-6;

fn format_scientific(value: f64, digits: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let s = format!("{value:.digits$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if mantissa.contains('.') => {
            let mantissa = mantissa.trim_end_matches('0').trim_end_matches('.');
            format!("{mantissa}e{exp}")
        }
        _ => s,
    }
}

fn format_tick(value: f64, decimals: usize) -> String {
    let mut s = format!("{value:.decimals$}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

// ---------------------------------------------------------------------------
// Legend
// ---------------------------------------------------------------------------

/// A horizontal colorbar: colours, ticks and where it goes.
#[derive(Debug, Clone)]
pub struct Legend {
    pub cmap: Colormap,
    pub range: ValueRange,
    pub ticks: Vec<f64>,
    pub labels: Vec<String>,
    pub layout: ColorbarLayout,
}

impl Legend {
    /// Evenly spaced ticks over `range`: one per caller label, or
    /// [`DEFAULT_TICKS`] formatted numbers.
    pub fn new(
        cmap: Colormap,
        range: ValueRange,
        labels: Option<Vec<String>>,
        layout: ColorbarLayout,
    ) -> Self {
        let n = labels.as_ref().map_or(DEFAULT_TICKS, Vec::len);
        let ticks = range.linspace(n);
        let labels = labels.unwrap_or_else(|| format_values(&ticks));
        Self {
            cmap,
            range,
            ticks,
            labels,
            layout,
        }
    }
}

/// A finished image and the legend drawn on it.
#[derive(Debug, Clone)]
pub struct Figure {
    pub image: RgbaImage,
    pub legend: Option<Legend>,
    /// Where the colorbar landed on `image`.
    pub colorbar: Option<Rect>,
}

/// Post-process a rendered PNG in place: flatten white to transparent if
/// asked, overlay `legend` and save over the original file.
pub fn finish(
    path: &Path,
    transparent: bool,
    legend: Option<Legend>,
    font: Option<&FontVec>,
) -> Result<Figure> {
    let image_err = |source| PlotError::Image {
        path: path.to_path_buf(),
        source,
    };
    let mut rendered = image::open(path).map_err(image_err)?.to_rgba8();
    if transparent {
        draw::make_transparent(&mut rendered);
    }

    let (image, colorbar) = match &legend {
        Some(legend) => {
            let (canvas, rect) = draw::composite(&rendered, legend, transparent, font);
            (canvas, Some(rect))
        }
        None => (rendered, None),
    };

    image.save(path).map_err(image_err)?;
    log::info!("Saved {} ({}x{})", path.display(), image.width(), image.height());
    Ok(Figure {
        image,
        legend,
        colorbar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_range_gets_three_compact_ticks() {
        let cmap = Colormap::by_name("magma").unwrap();
        let range = ValueRange::new(0.0, 1.0).unwrap();
        let legend = Legend::new(cmap, range, None, colorbar_layout(None, ColorbarPosition::Center));
        assert_eq!(legend.ticks, vec![0.0, 0.5, 1.0]);
        assert_eq!(legend.labels, vec!["0", "0.5", "1"]);
    }

    #[test]
    fn caller_labels_set_the_tick_count() {
        let cmap = Colormap::by_name("viridis").unwrap();
        let range = ValueRange::new(-1.0, 1.0).unwrap();
        let labels = vec!["low".to_string(), "mid".into(), "high".into(), "max".into(), "!".into()];
        let legend = Legend::new(cmap, range, Some(labels.clone()), colorbar_layout(None, ColorbarPosition::Bottom));
        assert_eq!(legend.ticks.len(), 5);
        assert_eq!(legend.ticks[2], 0.0);
        assert_eq!(legend.labels, labels);
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_values(&[0.0, 50.0, 100.0]), ["0", "50", "100"]);
        assert_eq!(format_values(&[-1.0, 0.0, 1.0]), ["-1", "0", "1"]);
        assert_eq!(format_values(&[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0]), ["0", "0.33", "0.67", "1"]);
        assert_eq!(format_values(&[0.001, 0.002]), ["0.001", "0.002"]);
        assert_eq!(format_values(&[2.5]), ["2.5"]);
    }

    #[test]
    fn tiny_ranges_switch_to_scientific() {
        let range = ValueRange::new(0.0, 1e-8).unwrap();
        assert_eq!(format_values(&range.linspace(3)), ["0", "5e-9", "1e-8"]);
        assert_eq!(format_values(&[1.0e-7, 1.5e-7]), ["1e-7", "1.5e-7"]);
    }

    #[test]
    fn layouts_by_hemisphere_and_position() {
        let center = colorbar_layout(None, ColorbarPosition::Center);
        assert!(center.ticks_above);
        assert!((center.x0 - 0.38).abs() < 1e-12);

        for layout in [
            colorbar_layout(None, ColorbarPosition::Bottom),
            colorbar_layout(Some(Hemisphere::Left), ColorbarPosition::Center),
            colorbar_layout(Some(Hemisphere::Right), ColorbarPosition::Bottom),
        ] {
            assert!(!layout.ticks_above);
            assert!(layout.y0 < 0.0);
        }
    }

    #[test]
    fn bottom_layout_sits_below_the_image() {
        let rect = colorbar_layout(Some(Hemisphere::Left), ColorbarPosition::Bottom).to_pixels(1000, 500);
        assert_eq!(rect.left(), 300);
        assert_eq!(rect.width(), 400);
        assert!(rect.top() >= 500);
        assert_eq!(rect.height(), 25);
    }
}

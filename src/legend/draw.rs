use ab_glyph::{FontVec, PxScale};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use super::Legend;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([255, 255, 255, 0]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Gap between tick marks and their labels, and below the lowest label.
const GAP: u32 = 4;

/// Make every pure-white pixel fully transparent. Colour channels are
/// never modified.
pub fn make_transparent(img: &mut RgbaImage) {
    for px in img.pixels_mut() {
        if px[0] == 255 && px[1] == 255 && px[2] == 255 {
            px[3] = 0;
        }
    }
}

/// Place `rendered` on a canvas and draw `legend` over it. The canvas
/// grows downward when the colorbar or its labels fall below the image.
pub fn composite(
    rendered: &RgbaImage,
    legend: &Legend,
    transparent: bool,
    font: Option<&FontVec>,
) -> (RgbaImage, Rect) {
    let (width, height) = rendered.dimensions();
    let bar = legend.layout.to_pixels(width, height);
    let font_px = (height as f32 * 0.035).clamp(12.0, 40.0);
    let tick_len = (bar.height() / 3).max(3);

    let bar_bottom = bar.top() + bar.height() as i32;
    let lowest = if legend.layout.ticks_above {
        bar_bottom
    } else {
        bar_bottom + (tick_len + GAP + font_px.ceil() as u32 + GAP) as i32
    };
    let canvas_height = (lowest.max(0) as u32).max(height);

    let background = if transparent { CLEAR } else { WHITE };
    let mut canvas = RgbaImage::from_pixel(width, canvas_height, background);
    imageops::overlay(&mut canvas, rendered, 0, 0);

    draw_colorbar(&mut canvas, legend, bar, tick_len, font, PxScale::from(font_px));
    (canvas, bar)
}

fn draw_colorbar(
    canvas: &mut RgbaImage,
    legend: &Legend,
    bar: Rect,
    tick_len: u32,
    font: Option<&FontVec>,
    scale: PxScale,
) {
    let last = (bar.width() - 1) as f64;
    for dx in 0..bar.width() {
        let color = Rgba(legend.cmap.sample_rgba8(f64::from(dx) / last));
        let column = Rect::at(bar.left() + dx as i32, bar.top()).of_size(1, bar.height());
        draw_filled_rect_mut(canvas, column, color);
    }
    draw_hollow_rect_mut(canvas, bar, INK);

    let span = legend.range.max - legend.range.min;
    let top = bar.top() as f32;
    let bottom = (bar.top() + bar.height() as i32 - 1) as f32;

    for (&tick, label) in legend.ticks.iter().zip(&legend.labels) {
        let t = if span > 0.0 {
            ((tick - legend.range.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let x = bar.left() as f32 + (t * last) as f32;

        let (from, to) = if legend.layout.ticks_above {
            (top, top - tick_len as f32)
        } else {
            (bottom, bottom + tick_len as f32)
        };
        draw_line_segment_mut(canvas, (x, from), (x, to), INK);

        let Some(font) = font else { continue };
        let (text_w, text_h) = text_size(scale, font, label);
        let text_x = x as i32 - (text_w as i32) / 2;
        let text_y = if legend.layout.ticks_above {
            to as i32 - (GAP + text_h) as i32
        } else {
            to as i32 + GAP as i32
        };
        draw_text_mut(canvas, INK, text_x, text_y, scale, font, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Colormap;
    use crate::data::model::{ColorbarPosition, Hemisphere, ValueRange};
    use crate::legend::colorbar_layout;

    fn legend(hemisphere: Option<Hemisphere>, position: ColorbarPosition) -> Legend {
        Legend::new(
            Colormap::by_name("magma").unwrap(),
            ValueRange::new(0.0, 1.0).unwrap(),
            None,
            colorbar_layout(hemisphere, position),
        )
    }

    #[test]
    fn only_pure_white_becomes_transparent() {
        let mut img = RgbaImage::new(4, 1);
        img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 0, Rgba([254, 255, 255, 255]));
        img.put_pixel(2, 0, Rgba([10, 20, 30, 255]));
        img.put_pixel(3, 0, Rgba([255, 255, 255, 128]));
        make_transparent(&mut img);

        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 0]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([254, 255, 255, 255]));
        assert_eq!(img.get_pixel(2, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(img.get_pixel(3, 0), &Rgba([255, 255, 255, 0]));
    }

    #[test]
    fn bottom_colorbar_extends_the_canvas() {
        let rendered = RgbaImage::from_pixel(200, 100, Rgba([10, 200, 10, 255]));
        let legend = legend(Some(Hemisphere::Left), ColorbarPosition::Bottom);
        let (canvas, bar) = composite(&rendered, &legend, false, None);

        assert_eq!(canvas.width(), 200);
        assert!(canvas.height() > 100);
        assert_eq!(canvas.get_pixel(5, 5), &Rgba([10, 200, 10, 255]));
        assert_eq!(canvas.get_pixel(5, canvas.height() - 1), &WHITE);

        let mid = (bar.top() + bar.height() as i32 / 2) as u32;
        let left = bar.left() as u32 + 1;
        let right = bar.left() as u32 + bar.width() - 2;
        let last = f64::from(bar.width() - 1);
        assert_eq!(canvas.get_pixel(left, mid).0, legend.cmap.sample_rgba8(1.0 / last));
        assert_eq!(
            canvas.get_pixel(right, mid).0,
            legend.cmap.sample_rgba8(f64::from(bar.width() - 2) / last)
        );
    }

    #[test]
    fn centered_colorbar_stays_inside_the_image() {
        let rendered = RgbaImage::from_pixel(400, 300, WHITE);
        let legend = legend(None, ColorbarPosition::Center);
        let (canvas, bar) = composite(&rendered, &legend, false, None);
        assert_eq!(canvas.dimensions(), (400, 300));
        assert!(bar.top() > 0 && bar.top() + (bar.height() as i32) < 300);
    }

    #[test]
    fn transparent_canvas_background() {
        let mut rendered = RgbaImage::from_pixel(100, 50, WHITE);
        make_transparent(&mut rendered);
        let legend = legend(Some(Hemisphere::Right), ColorbarPosition::Bottom);
        let (canvas, _) = composite(&rendered, &legend, true, None);
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
        assert_eq!(canvas.get_pixel(0, canvas.height() - 1)[3], 0);
    }
}

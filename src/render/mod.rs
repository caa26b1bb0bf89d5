//! 合成プレビュー画像の描画（内容・寸法・フォントメトリクスのみに依存する純粋関数）

mod font;
mod placeholder;
mod table;
mod text;

pub use font::BitmapFont;
pub use placeholder::{render_placeholder, truncate_to_width};
pub use table::{render_table_preview, truncate_title};
pub use text::{render_text_preview, render_titled_text, wrap_text};

use image::{Rgb, RgbImage};
use crate::types::Dimensions;

pub(crate) const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub(crate) const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub(crate) const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
pub(crate) const LIGHT_GRAY: Rgb<u8> = Rgb([192, 192, 192]);
pub(crate) const PANEL_GRAY: Rgb<u8> = Rgb([240, 240, 240]);
pub(crate) const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub(crate) const DARK_BLUE: Rgb<u8> = Rgb([0, 82, 165]);
pub(crate) const ICON_FILL: Rgb<u8> = Rgb([200, 230, 255]);
pub(crate) const ICON_FOLD: Rgb<u8> = Rgb([160, 200, 235]);

pub(crate) fn blank_canvas(dims: Dimensions, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(dims.width, dims.height, color)
}

// キャンバス外はクリップ
pub(crate) fn put_pixel_clipped(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    canvas.put_pixel(x as u32, y as u32, color);
}

pub(crate) fn fill_rect(canvas: &mut RgbImage, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
    for py in y..y + height as i64 {
        for px in x..x + width as i64 {
            put_pixel_clipped(canvas, px, py, color);
        }
    }
}

// 1px の枠線（width x height の外周）
pub(crate) fn stroke_rect(canvas: &mut RgbImage, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
    if width == 0 || height == 0 {
        return;
    }
    let right = x + width as i64 - 1;
    let bottom = y + height as i64 - 1;
    for px in x..=right {
        put_pixel_clipped(canvas, px, y, color);
        put_pixel_clipped(canvas, px, bottom, color);
    }
    for py in y..=bottom {
        put_pixel_clipped(canvas, x, py, color);
        put_pixel_clipped(canvas, right, py, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let mut canvas = blank_canvas(Dimensions::new(10, 10), WHITE);
        fill_rect(&mut canvas, -5, -5, 8, 8, BLACK);
        assert_eq!(*canvas.get_pixel(0, 0), BLACK);
        assert_eq!(*canvas.get_pixel(2, 2), BLACK);
        assert_eq!(*canvas.get_pixel(3, 3), WHITE);
    }

    #[test]
    fn test_stroke_rect_draws_outline_only() {
        let mut canvas = blank_canvas(Dimensions::new(10, 10), WHITE);
        stroke_rect(&mut canvas, 0, 0, 10, 10, GRAY);
        assert_eq!(*canvas.get_pixel(0, 0), GRAY);
        assert_eq!(*canvas.get_pixel(9, 9), GRAY);
        assert_eq!(*canvas.get_pixel(5, 5), WHITE);
    }
}

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};

use super::put_pixel_clipped;

const GLYPH_SIZE: u32 = 8;

/// 8x8 ビットマップフォント（整数倍で拡大）
///
/// 幅は文字数 × 8 × 倍率で決まるため、プラットフォームに依存しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFont {
    scale: u32,
}

impl BitmapFont {
    /// 本文用
    pub const REGULAR: BitmapFont = BitmapFont { scale: 1 };
    /// タイトル・ファイル名用
    pub const LARGE: BitmapFont = BitmapFont { scale: 2 };

    pub const fn new(scale: u32) -> Self {
        Self {
            scale: if scale == 0 { 1 } else { scale },
        }
    }

    pub fn advance(&self) -> u32 {
        GLYPH_SIZE * self.scale
    }

    pub fn glyph_height(&self) -> u32 {
        GLYPH_SIZE * self.scale
    }

    pub fn line_height(&self) -> u32 {
        (GLYPH_SIZE + 4) * self.scale
    }

    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.advance()
    }

    /// (x, y) はグリフ左上
    pub fn draw_text(&self, canvas: &mut RgbImage, text: &str, x: i64, y: i64, color: Rgb<u8>) {
        let mut cursor = x;
        for ch in text.chars() {
            self.draw_glyph(canvas, glyph(ch), cursor, y, color);
            cursor += self.advance() as i64;
        }
    }

    fn draw_glyph(&self, canvas: &mut RgbImage, rows: [u8; 8], x: i64, y: i64, color: Rgb<u8>) {
        let scale = self.scale as i64;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // bit 0 が左端
                if bits & (1 << col) == 0 {
                    continue;
                }
                let origin_x = x + col as i64 * scale;
                let origin_y = y + row as i64 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        put_pixel_clipped(canvas, origin_x + dx, origin_y + dy, color);
                    }
                }
            }
        }
    }
}

impl Default for BitmapFont {
    fn default() -> Self {
        Self::REGULAR
    }
}

// 未収録の文字は '?' で描画
fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

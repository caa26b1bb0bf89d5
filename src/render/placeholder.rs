use image::{DynamicImage, RgbImage};

use super::{
    blank_canvas, fill_rect, put_pixel_clipped, stroke_rect, BitmapFont, BLACK, BLUE, GRAY,
    ICON_FILL, ICON_FOLD, WHITE,
};
use crate::constants::{DEFAULT_CAPTION, ELLIPSIS};
use crate::types::Dimensions;

const TEXT_MARGIN: u32 = 20;

/// ファイルアイコン・ファイル名・固定キャプションのプレースホルダー
pub fn render_placeholder(file_name: &str, dims: Dimensions) -> DynamicImage {
    let (width, height) = (dims.width, dims.height);
    let mut canvas = blank_canvas(dims, WHITE);

    // 枠線
    stroke_rect(&mut canvas, 0, 0, width, height, GRAY);

    draw_file_icon(&mut canvas, width / 4, height / 4, width / 2, height / 3);

    // ファイル名（中央寄せ、収まらなければ省略）
    let name_font = BitmapFont::LARGE;
    let name = truncate_to_width(file_name, name_font, width.saturating_sub(TEXT_MARGIN));
    draw_centered(&mut canvas, &name, name_font, height * 3 / 4);

    // キャプション
    let caption_font = BitmapFont::REGULAR;
    draw_centered(&mut canvas, DEFAULT_CAPTION, caption_font, height * 4 / 5);

    DynamicImage::ImageRgb8(canvas)
}

/// 幅に収まるまで末尾を削って "..." を付ける（3文字未満にはしない）
pub fn truncate_to_width(text: &str, font: BitmapFont, max_width: u32) -> String {
    if font.text_width(text) <= max_width {
        return text.to_string();
    }

    let mut chars: Vec<char> = text.chars().collect();
    let ellipsis_width = font.text_width(ELLIPSIS);
    while chars.len() > 3 && (chars.len() as u32) * font.advance() + ellipsis_width > max_width {
        chars.pop();
    }

    let mut truncated: String = chars.into_iter().collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

// baseline はテキスト下端
fn draw_centered(canvas: &mut RgbImage, text: &str, font: BitmapFont, baseline: u32) {
    let text_width = font.text_width(text) as i64;
    let x = (canvas.width() as i64 - text_width) / 2;
    let y = baseline as i64 - font.glyph_height() as i64;
    font.draw_text(canvas, text, x, y, BLACK);
}

// 右上の角を折り返したファイルアイコン
fn draw_file_icon(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32) {
    let (x, y) = (x as i64, y as i64);
    fill_rect(canvas, x, y, width, height, ICON_FILL);
    stroke_rect(canvas, x, y, width, height, BLUE);

    let fold = (width.min(height) / 5) as i64;
    let corner_x = x + width as i64 - fold;
    for dy in 0..fold {
        for dx in 0..fold {
            let (px, py) = (corner_x + dx, y + dy);
            if dx > dy {
                // 切り取られた部分
                put_pixel_clipped(canvas, px, py, WHITE);
            } else if dx == dy {
                put_pixel_clipped(canvas, px, py, BLUE);
            } else {
                put_pixel_clipped(canvas, px, py, ICON_FOLD);
            }
        }
    }
    // 折り目の縁
    for d in 0..fold {
        put_pixel_clipped(canvas, corner_x, y + d, BLUE);
        put_pixel_clipped(canvas, corner_x + d, y + fold, BLUE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_is_untouched() {
        assert_eq!(truncate_to_width("report.bin", BitmapFont::LARGE, 380), "report.bin");
    }

    #[test]
    fn test_long_name_gets_ellipsis_and_fits() {
        let name = "a_really_long_file_name_that_cannot_possibly_fit.dat";
        let truncated = truncate_to_width(name, BitmapFont::LARGE, 380);
        assert!(truncated.ends_with("..."));
        assert!(BitmapFont::LARGE.text_width(&truncated) <= 380);
        assert!(name.starts_with(truncated.trim_end_matches("...")));
    }

    #[test]
    fn test_truncation_keeps_three_chars() {
        let truncated = truncate_to_width("abcdefgh", BitmapFont::LARGE, 10);
        assert_eq!(truncated, "abc...");
    }

    #[test]
    fn test_placeholder_layout() {
        let dims = Dimensions::new(400, 600);
        let img = render_placeholder("file.xyz", dims).to_rgb8();
        assert_eq!(img.dimensions(), (400, 600));
        // 枠線
        assert_eq!(*img.get_pixel(0, 300), GRAY);
        // アイコン内部
        assert_eq!(*img.get_pixel(200, 250), ICON_FILL);
        // アイコン外側は白
        assert_eq!(*img.get_pixel(50, 50), WHITE);
    }

    #[test]
    fn test_placeholder_depends_on_name() {
        let dims = Dimensions::new(400, 400);
        let a = render_placeholder("a.bin", dims);
        let b = render_placeholder("b.bin", dims);
        assert_ne!(a.as_bytes(), b.as_bytes());
    }
}

use image::DynamicImage;

use super::{blank_canvas, BitmapFont, BLACK, BLUE, LIGHT_GRAY, WHITE};
use crate::types::Dimensions;

const MARGIN: u32 = 10;
const TITLED_BODY_TOP: u32 = 40;

/// 貪欲法による折り返し
///
/// 単語を足した行幅が `max_width` を超えたら現在行を確定して次の行へ。
/// 改行文字は段落区切りとして扱う。
pub fn wrap_text(text: &str, font: BitmapFont, max_width: u32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if font.text_width(&candidate) > max_width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }

    lines
}

/// テキストプレビュー（フォールバック用・薄いグレー背景）
pub fn render_text_preview(text: &str, dims: Dimensions) -> DynamicImage {
    let mut canvas = blank_canvas(dims, LIGHT_GRAY);
    draw_wrapped(&mut canvas, text, MARGIN, MARGIN, dims);
    DynamicImage::ImageRgb8(canvas)
}

/// タイトル付きテキストプレビュー（白背景・青タイトル）
pub fn render_titled_text(title: &str, text: &str, dims: Dimensions) -> DynamicImage {
    let mut canvas = blank_canvas(dims, WHITE);
    BitmapFont::LARGE.draw_text(&mut canvas, title, MARGIN as i64, 8, BLUE);
    draw_wrapped(&mut canvas, text, MARGIN, TITLED_BODY_TOP, dims);
    DynamicImage::ImageRgb8(canvas)
}

fn draw_wrapped(canvas: &mut image::RgbImage, text: &str, x: u32, top: u32, dims: Dimensions) {
    let font = BitmapFont::REGULAR;
    let max_width = dims.width.saturating_sub(MARGIN * 2);

    let mut y = top;
    for line in wrap_text(text, font, max_width) {
        // はみ出す行は描画しない
        if y + font.glyph_height() > dims.height {
            break;
        }
        font.draw_text(canvas, &line, x as i64, y as i64, BLACK);
        y += font.line_height();
    }
}

use image::DynamicImage;

use super::{blank_canvas, fill_rect, BitmapFont, BLACK, DARK_BLUE, GRAY, PANEL_GRAY, WHITE};
use crate::constants::{ELLIPSIS, TABLE_TITLE_MAX_CHARS};
use crate::types::Dimensions;

const HEADER_HEIGHT: u32 = 25;
const FIRST_ROW_TOP: u32 = 32;
const ROW_STEP: u32 = 15;
const FOOTER_MARGIN: u32 = 5;
const LEFT: i64 = 5;

/// ヘッダー・データ行・フッターの固定レイアウト
pub fn render_table_preview(file_name: &str, lines: &[String], dims: Dimensions) -> DynamicImage {
    let mut canvas = blank_canvas(dims, PANEL_GRAY);

    // ヘッダー
    fill_rect(&mut canvas, 0, 0, dims.width, HEADER_HEIGHT, DARK_BLUE);
    let title_font = BitmapFont::LARGE;
    let title_top = (HEADER_HEIGHT.saturating_sub(title_font.glyph_height()) / 2) as i64;
    title_font.draw_text(&mut canvas, &truncate_title(file_name), LEFT, title_top, WHITE);

    // データ行
    let body = BitmapFont::REGULAR;
    let footer_top = dims.height.saturating_sub(FOOTER_MARGIN + body.glyph_height());
    let mut y = FIRST_ROW_TOP;
    for line in lines {
        // フッターに重なる行は描画しない
        if y + body.glyph_height() >= footer_top {
            break;
        }
        body.draw_text(&mut canvas, line, LEFT, y as i64, BLACK);
        y += ROW_STEP;
    }

    // フッター
    let footer = format!("{} rows shown", lines.len());
    body.draw_text(&mut canvas, &footer, LEFT, footer_top as i64, GRAY);

    DynamicImage::ImageRgb8(canvas)
}

/// ヘッダー用ファイル名（20文字超は 17文字 + "..."）
pub fn truncate_title(file_name: &str) -> String {
    if file_name.chars().count() > TABLE_TITLE_MAX_CHARS {
        let head: String = file_name
            .chars()
            .take(TABLE_TITLE_MAX_CHARS - ELLIPSIS.len())
            .collect();
        format!("{}{}", head, ELLIPSIS)
    } else {
        file_name.to_string()
    }
}

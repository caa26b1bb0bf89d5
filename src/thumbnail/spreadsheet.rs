use std::path::Path;
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::default::DefaultGenerator;
use super::Generator;
use crate::constants::{
    ELLIPSIS, MIME_CSV, PREVIEW_LINE_KEEP_CHARS, PREVIEW_LINE_MAX_CHARS, SPREADSHEET_PREVIEW_ROWS,
};
use crate::error::GenerationError;
use crate::render::render_table_preview;
use crate::strategy::Strategy;
use crate::types::{Dimensions, PreviewContent, PreviewKind, SourceFile};

/// CSV・ブックの先頭行を表形式で描画する
///
/// 読み込みに失敗したらプレースホルダーに切り替える（エラーは返さない）。
pub struct SpreadsheetGenerator {
    fallback: DefaultGenerator,
    canvas: Dimensions,
}

impl SpreadsheetGenerator {
    pub fn new(canvas: Dimensions) -> Self {
        Self {
            fallback: DefaultGenerator::new(canvas),
            canvas,
        }
    }
}

#[async_trait]
impl Generator for SpreadsheetGenerator {
    fn strategy(&self) -> Strategy {
        Strategy::Spreadsheet
    }

    async fn generate(
        &self,
        source: &SourceFile,
        cancel: &CancellationToken,
    ) -> Result<PreviewContent, GenerationError> {
        let path = source.path.clone();
        let is_csv = source.extension() == "csv" || source.content_type.starts_with(MIME_CSV);

        match tokio::task::spawn_blocking(move || read_preview_lines(&path, is_csv)).await? {
            Ok(lines) => {
                let image = render_table_preview(&source.file_name(), &lines, self.canvas);
                Ok(PreviewContent::synthetic(image, PreviewKind::Table { lines }))
            }
            Err(e) => {
                warn!(path = %source.path.display(), error = %e, "表の読み込みに失敗、プレースホルダーを使用");
                Ok(self.fallback.generate(source, cancel).await?.into_degraded())
            }
        }
    }
}

/// プレビュー行を読む（CSV は先頭 3 レコード、ブックはヘッダー＋3 行）
pub fn read_preview_lines(path: &Path, is_csv: bool) -> Result<Vec<String>, GenerationError> {
    let raw = if is_csv {
        read_csv_lines(path, SPREADSHEET_PREVIEW_ROWS)?
    } else {
        read_workbook_rows(path, Some(SPREADSHEET_PREVIEW_ROWS + 1))?
            .into_iter()
            .map(|row| row.join(", "))
            .collect()
    };

    Ok(raw.iter().map(|line| sanitize_line(line)).collect())
}

fn read_csv_lines(path: &Path, max_records: usize) -> Result<Vec<String>, GenerationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let mut lines = Vec::with_capacity(max_records);
    for record in reader.records().take(max_records) {
        let record = record.map_err(csv_error)?;
        lines.push(record.iter().collect::<Vec<_>>().join(", "));
    }
    Ok(lines)
}

fn csv_error(err: csv::Error) -> GenerationError {
    GenerationError::Unreadable(format!("CSV 読み込みエラー: {}", err))
}

/// 最初のシートのセル文字列（数式はキャッシュ値）
pub(crate) fn read_workbook_rows(
    path: &Path,
    max_rows: Option<usize>,
) -> Result<Vec<Vec<String>>, GenerationError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| GenerationError::Unreadable(format!("ブック読み込みエラー: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| GenerationError::Unreadable("シートがありません".to_string()))?
        .map_err(|e| GenerationError::Unreadable(format!("シート読み込みエラー: {}", e)))?;

    let limit = max_rows.unwrap_or(usize::MAX);
    Ok(range
        .rows()
        .take(limit)
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 前後空白除去 → 50 文字超は 47 文字＋"..." → 印字可能 ASCII のみ → 連続空白を 1 つに
pub fn sanitize_line(line: &str) -> String {
    let trimmed = line.trim();
    let limited = if trimmed.chars().count() > PREVIEW_LINE_MAX_CHARS {
        let mut kept: String = trimmed.chars().take(PREVIEW_LINE_KEEP_CHARS).collect();
        kept.push_str(ELLIPSIS);
        kept
    } else {
        trimmed.to_string()
    };

    let mut out = String::with_capacity(limited.len());
    let mut previous_space = false;
    for c in limited.chars().filter(|c| (' '..='~').contains(c)) {
        if c == ' ' {
            if !previous_space {
                out.push(' ');
            }
            previous_space = true;
        } else {
            out.push(c);
            previous_space = false;
        }
    }
    out
}

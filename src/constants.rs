// サムネイル設定（縦長キャンバス 400x600、正方形プロファイルは 400x400）
pub const THUMBNAIL_WIDTH: u32 = 400;
pub const THUMBNAIL_HEIGHT: u32 = 600;
pub const THUMBNAIL_SQUARE_HEIGHT: u32 = 400;

// 出力ファイル名: thumb_<ベース名>.<拡張子>
pub const THUMBNAIL_PREFIX: &str = "thumb_";

// ファイルサイズ上限（10MiB）
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

// 画像サイズ制限（DoS防止）
pub const MAX_IMAGE_DIMENSION: u32 = 65535;      // 最大辺長
pub const MAX_PIXEL_COUNT: u64 = 100_000_000;    // 最大ピクセル数（100メガピクセル）

// 生成の試行回数（同じ戦略で再試行）
pub const MAX_GENERATION_ATTEMPTS: u32 = 2;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

// 非可逆形式（JPEG）で出力する拡張子
pub const LOSSY_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tif", "tiff", "bmp"];

// 外部プロセス
pub const VIDEO_FRAME_TIMESTAMP: &str = "00:00:01.000";
pub const PROCESS_TIMEOUT_SECS: u64 = 60;

// PDF
pub const PDF_RENDER_DPI: u32 = 150;
pub const PDF_TEXT_PREVIEW_CHARS: usize = 200;

// 表形式プレビュー
pub const SPREADSHEET_PREVIEW_ROWS: usize = 3;
pub const PREVIEW_LINE_MAX_CHARS: usize = 50;
pub const PREVIEW_LINE_KEEP_CHARS: usize = 47;
pub const TABLE_TITLE_MAX_CHARS: usize = 20;

// 固定文言
pub const DEFAULT_CAPTION: &str = "No Preview Available";
pub const PASSWORD_PROTECTED_TEXT: &str = "Password Protected\nContent Not Accessible";
pub const NO_TEXT_EXTRACTED: &str = "No text extracted";
pub const ELLIPSIS: &str = "...";

// ディレクトリ走査
pub const MAX_WALK_DEPTH: usize = 32;
pub const DIRECTORY_RETRY_ATTEMPTS: u32 = 3;
pub const DIRECTORY_RETRY_BACKOFF_MS: u64 = 200;

// 処理済みパスキャッシュ
pub const PROCESSED_CACHE_CAPACITY: u64 = 100_000;

// MIME タイプ
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_CSV: &str = "text/csv";
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";
pub const MIME_PSD: &str = "image/vnd.adobe.photoshop";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_XLS: &str = "application/vnd.ms-excel";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_PPT: &str = "application/vnd.ms-powerpoint";
pub const MIME_PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

// Office 文書として扱う MIME タイプ
pub const OFFICE_MIME_TYPES: &[&str] = &[
    MIME_DOC, MIME_DOCX, MIME_XLS, MIME_XLSX, MIME_PPT, MIME_PPTX,
];

// 表計算として扱う MIME タイプ
pub const SPREADSHEET_MIME_TYPES: &[&str] = &[MIME_CSV, MIME_XLS, MIME_XLSX];

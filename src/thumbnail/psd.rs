use image::DynamicImage;
use crate::error::GenerationError;
use crate::image_utils::validate_dimensions;
use crate::types::Dimensions;

const PSD_SIGNATURE: &[u8] = b"8BPS";
const RESOURCE_SIGNATURE: &[u8] = b"8BIM";
// バージョン〜カラーモード（シグネチャの後ろ 22 バイト）
const FILE_HEADER_REST: usize = 22;
// 1036 = Photoshop 5.0 以降、1033 = 旧形式
const THUMBNAIL_RESOURCE_IDS: [u16; 2] = [1036, 1033];
// format(4) width(4) height(4) widthbytes(4) totalsize(4) compressedsize(4) bpp(2) planes(2)
const THUMBNAIL_HEADER_LEN: usize = 28;
const THUMBNAIL_FORMAT_JPEG: u32 = 1;

/// 境界チェック付きのビッグエンディアン読み取り
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    // 残りより長い要求は None（宣言長を信用しない）
    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            return None;
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Some(bytes)
    }

    fn skip(&mut self, len: usize) -> Option<()> {
        self.take(len).map(|_| ())
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

// イメージリソースから埋め込み JPEG サムネイルを探す
fn extract_embedded_jpeg(data: &[u8]) -> Option<&[u8]> {
    let mut reader = ByteReader::new(data);
    if reader.take(PSD_SIGNATURE.len())? != PSD_SIGNATURE {
        return None;
    }
    reader.skip(FILE_HEADER_REST)?;

    let color_mode_len = reader.u32()? as usize;
    reader.skip(color_mode_len)?;

    // 途中で切れたファイルは読めるところまで
    let resources_len = (reader.u32()? as usize).min(reader.remaining());
    let mut resources = ByteReader::new(reader.take(resources_len)?);

    while resources.remaining() > 0 {
        if resources.take(RESOURCE_SIGNATURE.len())? != RESOURCE_SIGNATURE {
            return None;
        }
        let id = resources.u16()?;

        // パスカル文字列。長さバイト込みで偶数長
        let name_len = resources.u8()? as usize;
        resources.skip(name_len + (name_len + 1) % 2)?;

        let size = resources.u32()? as usize;
        let body = resources.take(size)?;
        let _ = resources.skip(size % 2);

        if THUMBNAIL_RESOURCE_IDS.contains(&id) {
            if let Some(jpeg) = thumbnail_jpeg(body) {
                return Some(jpeg);
            }
        }
    }

    None
}

fn thumbnail_jpeg(body: &[u8]) -> Option<&[u8]> {
    let mut reader = ByteReader::new(body);
    if reader.u32()? != THUMBNAIL_FORMAT_JPEG {
        return None;
    }
    reader.skip(THUMBNAIL_HEADER_LEN - 4)?;
    let jpeg = reader.take(reader.remaining())?;
    (!jpeg.is_empty()).then_some(jpeg)
}

/// PSD を画像として読み込む
///
/// 埋め込みサムネイルがキャンバス幅・高さのどちらか以上なら採用し、
/// それ以外はフルコンポジットを行う。
pub fn decode_psd(data: &[u8], canvas: Dimensions) -> Result<DynamicImage, GenerationError> {
    if let Some(jpeg_data) = extract_embedded_jpeg(data) {
        if let Ok(img) = image::load_from_memory_with_format(jpeg_data, image::ImageFormat::Jpeg) {
            if img.width() >= canvas.width || img.height() >= canvas.height {
                return Ok(img);
            }
            // 小さすぎる場合はフルコンポジットにフォールバック
        }
    }

    let psd_file = psd::Psd::from_bytes(data)
        .map_err(|e| GenerationError::Unreadable(format!("PSD読み込みエラー: {:?}", e)))?;

    let width = psd_file.width();
    let height = psd_file.height();
    validate_dimensions(width, height)?;

    let rgba = image::RgbaImage::from_raw(width, height, psd_file.rgba())
        .ok_or_else(|| GenerationError::Unreadable("PSD画像データの変換に失敗".to_string()))?;

    Ok(DynamicImage::ImageRgba8(rgba))
}

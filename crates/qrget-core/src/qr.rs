//! 二维码生成
//!
//! 把 URL 编码为灰度位图，供预览窗口显示。

use image::Luma;
use qrcode::QrCode;
use qrcode::types::QrError as EncodeError;

pub use qrcode::EcLevel;

use crate::error::QrError;
use crate::url::ServingUrl;

/// 灰度位图（每像素 1 字节，行优先）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl CodeImage {
    /// 坐标越界时返回 `None`
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// 编码 URL，图像边长不小于 `size` 像素（含静区）
pub fn encode(url: &ServingUrl, level: EcLevel, size: u32) -> Result<CodeImage, QrError> {
    let data = url.as_str().as_bytes();
    let code = QrCode::with_error_correction_level(data, level).map_err(|e| match e {
        EncodeError::DataTooLong => QrError::TooLong(data.len()),
        other => QrError::Encode(other.to_string()),
    })?;

    let buffer = code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .build();

    Ok(CodeImage {
        width: buffer.width(),
        height: buffer.height(),
        pixels: buffer.into_raw(),
    })
}

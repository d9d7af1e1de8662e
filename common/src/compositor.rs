//! 背景合成モジュール
//!
//! 640x480のキャンバスに背景を敷き、写真を固定枠（280x350 @ 180,65）へ
//! 引き伸ばして重ね、JPEGにエンコードする。写真の縦横比は維持しない
//! （出力互換のため）。
//!
//! 処理は純粋関数: 入力バイト列と背景指定から出力バイト列を作るだけで、
//! キャンバスは1枚ごとに作り直す。

use crate::error::{Error, Result};
use crate::layout::{
    CANVAS_HEIGHT, CANVAS_WIDTH, DEFAULT_JPEG_QUALITY, PHOTO_HEIGHT, PHOTO_WIDTH, PHOTO_X, PHOTO_Y,
};
use crate::types::{BackgroundSpec, Matched, ProcessedImage, UploadedImage};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage, RgbImage};

const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// デコード・リサイズ済みの背景（バッチ内で使い回す）
#[derive(Debug, Clone)]
pub struct PreparedBackground {
    canvas: RgbaImage,
}

impl PreparedBackground {
    pub fn prepare(spec: &BackgroundSpec) -> Result<Self> {
        let canvas = match spec {
            BackgroundSpec::Palette(palette) => {
                let [r, g, b] = palette.rgb();
                RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([r, g, b, 0xFF]))
            }
            BackgroundSpec::Custom(bytes) => {
                let decoded = image::load_from_memory(bytes)
                    .map_err(|e| Error::decode("background", e))?;
                imageops::resize(&decoded.to_rgba8(), CANVAS_WIDTH, CANVAS_HEIGHT, RESIZE_FILTER)
            }
        };
        Ok(Self { canvas })
    }
}

/// 合成器
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    jpeg_quality: u8,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl Compositor {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// 写真1枚を合成してJPEGバイト列を返す
    pub fn composite(&self, image: &UploadedImage, background: &BackgroundSpec) -> Result<Vec<u8>> {
        let prepared = PreparedBackground::prepare(background)?;
        self.composite_prepared(image, &prepared)
    }

    pub fn composite_prepared(
        &self,
        image: &UploadedImage,
        background: &PreparedBackground,
    ) -> Result<Vec<u8>> {
        let canvas = render_canvas(image, background)?;
        self.encode(&canvas)
    }

    /// 照合済みの1件を処理して出力画像を作る
    pub fn process(&self, matched: &Matched, background: &PreparedBackground) -> Result<ProcessedImage> {
        let encoded = self.composite_prepared(matched.image(), background)?;
        Ok(ProcessedImage::new(
            matched.new_name().to_string(),
            encoded,
            matched.record().clone(),
        ))
    }

    fn encode(&self, canvas: &RgbImage) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality);
        encoder
            .encode_image(canvas)
            .map_err(|e| Error::Encode(e.to_string()))?;
        Ok(buf)
    }
}

/// キャンバスを描画（エンコード前）
///
/// 背景 → 写真の順に描く。写真のアルファは背景の上で合成される。
pub fn render_canvas(image: &UploadedImage, background: &PreparedBackground) -> Result<RgbImage> {
    let photo = image::load_from_memory(image.bytes())
        .map_err(|e| Error::decode(image.file_name(), e))?;
    let photo = imageops::resize(&photo.to_rgba8(), PHOTO_WIDTH, PHOTO_HEIGHT, RESIZE_FILTER);

    let mut canvas = background.canvas.clone();
    imageops::overlay(&mut canvas, &photo, i64::from(PHOTO_X), i64::from(PHOTO_Y));

    Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

/// 合成結果の簡易チェック用: JPEGを読み戻して寸法を返す
pub fn encoded_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let decoded = image::load_from_memory(bytes).map_err(|e| Error::decode("output", e))?;
    Ok((decoded.width(), decoded.height()))
}

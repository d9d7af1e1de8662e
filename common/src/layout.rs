//! レイアウト定数モジュール
//!
//! 合成画像の配置は固定。ここが唯一の定義元（Source of Truth）。

// ============================================
// キャンバス
// ============================================

/// キャンバスサイズ（px）
pub const CANVAS_WIDTH: u32 = 640;
pub const CANVAS_HEIGHT: u32 = 480;

// ============================================
// 写真枠
// ============================================

/// 写真枠サイズ（px）。縦横比は維持せず枠いっぱいに引き伸ばす
pub const PHOTO_WIDTH: u32 = 280;
pub const PHOTO_HEIGHT: u32 = 350;

/// 写真枠の左上位置（px）
pub const PHOTO_X: u32 = 180;
pub const PHOTO_Y: u32 = 65;

// ============================================
// 出力
// ============================================

/// JPEG品質（0-100）。元の0.9に相当
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// 背景色（RGB）
pub const WHITE_RGB: [u8; 3] = [0xFF, 0xFF, 0xFF];
pub const LIGHT_BLUE_RGB: [u8; 3] = [0xE6, 0xF0, 0xFF];
pub const LIGHT_GRAY_RGB: [u8; 3] = [0xF3, 0xF4, 0xF6];

/// 写真枠の右端・下端（排他的）
pub const fn photo_box_right() -> u32 {
    PHOTO_X + PHOTO_WIDTH
}

pub const fn photo_box_bottom() -> u32 {
    PHOTO_Y + PHOTO_HEIGHT
}

/// 座標が写真枠の内側か
pub fn in_photo_box(x: u32, y: u32) -> bool {
    (PHOTO_X..photo_box_right()).contains(&x) && (PHOTO_Y..photo_box_bottom()).contains(&y)
}

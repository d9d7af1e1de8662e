//! photo-onboard
//!
//! 社員スプレッドシートと写真を照合し、固定レイアウトで背景と合成して
//! `<username>.jpg` にリネームし、ZIPと対応表Excelにまとめる。

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod scanner;
pub mod sheet;

pub use photo_onboard_common as common;

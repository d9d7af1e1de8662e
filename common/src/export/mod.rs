//! エクスポート（画像ZIP + 対応表Excel）
//!
//! 合成済み画像の一覧から、アーカイブとスプレッドシートの組を作る。
//! どちらもバッファで保持するので、書き出しに失敗しても再合成せずに
//! 再エクスポートできる。

pub mod archive_core;
pub mod excel_core;

pub use archive_core::COMPRESSION_LEVEL;
pub use excel_core::ReportRow;

use crate::error::Result;
use crate::types::ProcessedImage;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 出力名が重複したときの扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// 後勝ちで上書き
    #[default]
    Overwrite,
    /// `_2`, `_3` ... を付けて別名にする
    Suffix,
    /// エラーにする
    Fail,
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "suffix" => Ok(CollisionPolicy::Suffix),
            "fail" => Ok(CollisionPolicy::Fail),
            _ => Err(format!("Unknown collision policy: {}. Use overwrite, suffix, or fail", s)),
        }
    }
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollisionPolicy::Overwrite => write!(f, "overwrite"),
            CollisionPolicy::Suffix => write!(f, "suffix"),
            CollisionPolicy::Fail => write!(f, "fail"),
        }
    }
}

/// エクスポート設定
///
/// 圧縮レベルは固定（`COMPRESSION_LEVEL`）で、ここでは指定できない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    pub collision: CollisionPolicy,
}

/// エクスポート成果物
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    /// ZIPバイト列
    pub archive: Vec<u8>,
    /// XLSXバイト列
    pub spreadsheet: Vec<u8>,
    /// スプレッドシートに書いた行（合成済み画像と同順）
    pub rows: Vec<ReportRow>,
    /// アーカイブのエントリ数
    pub archive_entries: usize,
    /// 重複した出力名
    pub collisions: Vec<String>,
}

/// 合成済み画像をZIPと対応表にまとめる
pub fn bundle(processed: &[ProcessedImage], options: &ExportOptions) -> Result<ExportBundle> {
    let resolved = archive_core::resolve_entries(processed, options.collision)?;
    for name in &resolved.collisions {
        warn!(name = %name, policy = %options.collision, "duplicate output name");
    }

    let archive = archive_core::build_archive(&resolved.entries)?;

    let rows: Vec<ReportRow> = processed
        .iter()
        .zip(&resolved.final_names)
        .map(|(item, filename)| ReportRow {
            username: item.source_record().username().to_string(),
            filename: filename.clone(),
        })
        .collect();
    let spreadsheet = excel_core::generate_report_buffer(&rows)?;

    info!(
        entries = resolved.entries.len(),
        rows = rows.len(),
        archive_bytes = archive.len(),
        "export bundle built"
    );

    Ok(ExportBundle {
        archive,
        spreadsheet,
        archive_entries: resolved.entries.len(),
        collisions: resolved.collisions,
        rows,
    })
}

//! エクスポート（CLI版）
//!
//! 共通ライブラリで作ったZIP・対応表をディスクに書き出し、
//! 照合できなかった画像・失敗した画像を `report.json` に残す。

use crate::batch::{BatchReport, ItemFailure};
use crate::error::Result;
use photo_onboard_common::{bundle, ExportBundle, ExportOptions, ProcessedImage, UploadedImage};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ARCHIVE_FILE_NAME: &str = "imagenes_procesadas.zip";
pub const SPREADSHEET_FILE_NAME: &str = "usuarios_imagenes.xlsx";
pub const REPORT_FILE_NAME: &str = "report.json";

/// 書き出し先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub archive: PathBuf,
    pub spreadsheet: PathBuf,
}

impl ExportPaths {
    pub fn in_dir(output_dir: &Path) -> Self {
        Self {
            archive: output_dir.join(ARCHIVE_FILE_NAME),
            spreadsheet: output_dir.join(SPREADSHEET_FILE_NAME),
        }
    }
}

/// 作成済みのバンドルを書き出す（再合成なしで再試行できる）
pub fn write_bundle(bundle: &ExportBundle, output_dir: &Path) -> Result<ExportPaths> {
    std::fs::create_dir_all(output_dir)?;
    let paths = ExportPaths::in_dir(output_dir);

    std::fs::write(&paths.archive, &bundle.archive)?;
    std::fs::write(&paths.spreadsheet, &bundle.spreadsheet)?;

    info!(
        archive = %paths.archive.display(),
        spreadsheet = %paths.spreadsheet.display(),
        "bundle written"
    );
    Ok(paths)
}

/// 合成済み画像をまとめて書き出す
pub fn export_results(
    processed: &[ProcessedImage],
    options: &ExportOptions,
    output_dir: &Path,
) -> Result<(ExportBundle, ExportPaths)> {
    let bundle = bundle(processed, options)?;
    let paths = write_bundle(&bundle, output_dir)?;
    Ok((bundle, paths))
}

/// 実行結果の記録
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub generated_at: String,
    pub total_images: usize,
    pub matched: usize,
    /// 照合できなかった画像（処理対象外）
    pub unmatched: Vec<String>,
    pub processed: usize,
    /// 照合できたが合成に失敗した画像
    pub failures: Vec<ItemFailure>,
    pub cancelled: bool,
    /// 重複した出力名
    pub collisions: Vec<String>,
    pub export_error: Option<String>,
}

impl RunReport {
    pub fn new(total_images: usize, unmatched: &[UploadedImage], batch: &BatchReport) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_images,
            matched: total_images - unmatched.len(),
            unmatched: unmatched.iter().map(|i| i.file_name().to_string()).collect(),
            processed: batch.processed.len(),
            failures: batch.failures.clone(),
            cancelled: batch.cancelled,
            collisions: Vec::new(),
            export_error: None,
        }
    }

    pub fn with_export_result(mut self, result: std::result::Result<&ExportBundle, String>) -> Self {
        match result {
            Ok(bundle) => self.collisions = bundle.collisions.clone(),
            Err(message) => self.export_error = Some(message),
        }
        self
    }
}

pub fn write_run_report(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(REPORT_FILE_NAME);
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

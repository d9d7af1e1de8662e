//! Photo Onboard Common Library
//!
//! 写真照合・背景合成・エクスポートの各ステージ。
//! どれも入力から出力を作るだけの純粋な処理で、CLIから順に呼ばれる:
//!
//! 表 → `parser` → レコード → `matcher` → 照合結果 → `compositor` → 合成画像 → `export`

pub mod types;
pub mod layout;
pub mod error;
pub mod parser;
pub mod matcher;
pub mod compositor;
pub mod export;

pub use types::{
    BackgroundSpec, CellValue, EmployeeRecord, ExtraFields, MatchOutcome, Matched, Palette,
    ProcessedImage, RawTable, RecordTable, UploadedImage, EMPLOYEE_CODE_COLUMN, USERNAME_COLUMN,
};
pub use error::{Error, Result};
pub use parser::parse_records;
pub use matcher::{match_images, matched_only, summarize, unmatched_only, MatchSummary};
pub use compositor::{Compositor, PreparedBackground};
pub use export::{bundle, CollisionPolicy, ExportBundle, ExportOptions, ReportRow};

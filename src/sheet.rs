//! スプレッドシート読み込み
//!
//! 最初のシートのみを読み、1行目をヘッダーとして `RawTable` に変換する。
//! 形式（xlsx / xlsm / xls / xlsb / ods）は内容から自動判定する。
//!
//! 空行もそのまま残す（エラーの行番号がシート上の行番号と一致するように）。
//! 空行の読み飛ばしはパーサー側で行う。

use crate::error::{PhotoOnboardError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use photo_onboard_common::{CellValue, RawTable};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// ファイルから最初のシートを読み込む
///
/// ファイルがない場合もスプレッドシートのエラー（`Workbook`）として返す。
pub fn read_first_sheet(path: &Path) -> Result<RawTable> {
    if !path.is_file() {
        return Err(PhotoOnboardError::Workbook(format!(
            "ファイルが見つかりません: {}",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)?;
    read_first_sheet_from_bytes(bytes)
}

/// バイト列から最初のシートを読み込む
pub fn read_first_sheet_from_bytes(bytes: Vec<u8>) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| PhotoOnboardError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PhotoOnboardError::Workbook("シートがありません".into()))?
        .map_err(|e| PhotoOnboardError::Workbook(e.to_string()))?;

    let table = range_to_table(&range);
    debug!(columns = table.headers.len(), rows = table.rows.len(), "sheet loaded");
    Ok(table)
}

fn range_to_table(range: &Range<Data>) -> RawTable {
    let mut rows = range.rows();

    let headers = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| to_cell_value(c).key_text())
            .collect(),
        None => return RawTable::default(),
    };

    let rows = rows
        .map(|row| row.iter().map(to_cell_value).collect::<Vec<_>>())
        .collect();

    RawTable::new(headers, rows)
}

fn to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        // 日付・エラーは表示文字列として渡す
        other => CellValue::Text(other.to_string()),
    }
}

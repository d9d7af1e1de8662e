//! 対応表Excel生成（共通ライブラリ）
//!
//! `Username` / `Filename` の2列。1行 = 合成に成功した画像1枚。

use crate::error::Result;
use rust_xlsxwriter::{Format, Workbook};

/// シート名
pub const REPORT_SHEET_NAME: &str = "Usuarios_Imagenes";

pub const USERNAME_HEADER: &str = "Username";
pub const FILENAME_HEADER: &str = "Filename";

/// 対応表の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub username: String,
    pub filename: String,
}

/// Excelをバッファに生成
pub fn generate_report_buffer(rows: &[ReportRow]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(REPORT_SHEET_NAME)?;
    worksheet.write_string_with_format(0, 0, USERNAME_HEADER, &header_format)?;
    worksheet.write_string_with_format(0, 1, FILENAME_HEADER, &header_format)?;

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.username)?;
        worksheet.write_string(r, 1, &row.filename)?;
    }
    worksheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

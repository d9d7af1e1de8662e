//! 社員スプレッドシートのパーサー
//!
//! 1行目をヘッダーとして読み、必須2列（ユーザー名・社員コード）を検証する。
//! それ以外の列は `extra_fields` にそのまま渡す。重複コードは除去しない
//! （照合側で先勝ちとする）。

use crate::error::{Error, Result};
use crate::types::{
    CellValue, EmployeeRecord, RawTable, RecordTable, EMPLOYEE_CODE_COLUMN, USERNAME_COLUMN,
};

/// 表を社員レコード一覧に変換
pub fn parse_records(table: &RawTable) -> Result<RecordTable> {
    // (元の行インデックス, 行)。空行は読み飛ばすが行番号には数える（rows[i] = シートの i+2 行目）
    let rows: Vec<(usize, &Vec<CellValue>)> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !row.iter().all(CellValue::is_empty))
        .collect();

    if rows.is_empty() {
        return Err(Error::Format(format_hint("no data rows")));
    }

    let username_idx = table
        .column_index(USERNAME_COLUMN)
        .ok_or_else(|| Error::Format(format_hint(&format!("missing column \"{}\"", USERNAME_COLUMN))))?;
    let code_idx = table
        .column_index(EMPLOYEE_CODE_COLUMN)
        .ok_or_else(|| Error::Format(format_hint(&format!("missing column \"{}\"", EMPLOYEE_CODE_COLUMN))))?;

    let mut records = Vec::with_capacity(rows.len());

    for (i, (row_idx, row)) in rows.iter().enumerate() {
        let username = cell(row, username_idx).key_text();
        let code = cell(row, code_idx).key_text();

        if username.is_empty() || code.is_empty() {
            let which = if username.is_empty() { USERNAME_COLUMN } else { EMPLOYEE_CODE_COLUMN };
            let msg = if i == 0 {
                format_hint(&format!("first row has no \"{}\"", which))
            } else {
                format!("row {}: \"{}\" is empty", row_idx + 2, which)
            };
            return Err(Error::Format(msg));
        }

        let extra_fields = table
            .headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != username_idx && *idx != code_idx)
            .map(|(idx, header)| (header.clone(), cell(row, idx).clone()))
            .collect();

        records.push(EmployeeRecord::new(username, code)?.with_extra_fields(extra_fields));
    }

    Ok(RecordTable::new(records))
}

fn cell(row: &[CellValue], idx: usize) -> &CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    row.get(idx).unwrap_or(&EMPTY)
}

fn format_hint(detail: &str) -> String {
    format!(
        "{} (the sheet must contain the columns \"{}\" and \"{}\")",
        detail, USERNAME_COLUMN, EMPLOYEE_CODE_COLUMN
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn headers() -> Vec<String> {
        vec![
            USERNAME_COLUMN.to_string(),
            "Departamento".to_string(),
            EMPLOYEE_CODE_COLUMN.to_string(),
        ]
    }

    #[test]
    fn test_parse_basic() {
        let table = RawTable::new(
            headers(),
            vec![
                vec![text("jdoe"), text("IT"), CellValue::Number(1001.0)],
                vec![text("asmith"), text("HR"), text("A-7")],
            ],
        );

        let records = parse_records(&table).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.records[0].username(), "jdoe");
        assert_eq!(records.records[0].employee_code(), "1001");
        assert_eq!(records.records[0].derived_filename(), "jdoe.jpg");
        assert_eq!(records.records[0].derived_code_key(), "1001.jpg");
        assert_eq!(records.records[1].derived_code_key(), "A-7.jpg");
    }

    #[test]
    fn test_extra_fields_pass_through_in_order() {
        let mut hdrs = headers();
        hdrs.push("Puesto".to_string());
        let table = RawTable::new(
            hdrs,
            vec![vec![text("jdoe"), text("IT"), text("1001"), text("Analista")]],
        );

        let records = parse_records(&table).unwrap();
        let extra = &records.records[0].extra_fields;
        assert_eq!(extra.len(), 2);
        assert_eq!(extra[0], ("Departamento".to_string(), text("IT")));
        assert_eq!(extra[1], ("Puesto".to_string(), text("Analista")));
    }

    #[test]
    fn test_empty_table_is_format_error() {
        let table = RawTable::new(headers(), vec![]);
        assert!(matches!(parse_records(&table), Err(Error::Format(_))));
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let table = RawTable::new(
            vec![USERNAME_COLUMN.to_string()],
            vec![vec![text("jdoe")]],
        );
        let err = parse_records(&table).unwrap_err();
        assert!(matches!(err, Error::Format(ref m) if m.contains(EMPLOYEE_CODE_COLUMN)));
    }

    #[test]
    fn test_first_row_without_value_is_format_error() {
        let table = RawTable::new(
            headers(),
            vec![vec![text("jdoe"), text("IT"), CellValue::Empty]],
        );
        assert!(matches!(parse_records(&table), Err(Error::Format(_))));
    }

    #[test]
    fn test_later_row_without_value_reports_row_number() {
        let table = RawTable::new(
            headers(),
            vec![
                vec![text("jdoe"), text("IT"), text("1001")],
                vec![text(""), text("IT"), text("1002")],
            ],
        );
        let err = parse_records(&table).unwrap_err();
        assert!(matches!(err, Error::Format(ref m) if m.contains("row 3")));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let table = RawTable::new(
            headers(),
            vec![
                vec![text("jdoe"), text("IT"), text("1001")],
                vec![CellValue::Empty, text(" "), CellValue::Empty],
                vec![text("asmith"), text("HR"), text("1002")],
            ],
        );
        assert_eq!(parse_records(&table).unwrap().len(), 2);
    }

    #[test]
    fn test_row_number_counts_blank_rows() {
        let table = RawTable::new(
            headers(),
            vec![
                vec![text("jdoe"), text("IT"), text("1001")],
                vec![CellValue::Empty, CellValue::Empty, CellValue::Empty],
                vec![text("asmith"), text("HR"), CellValue::Empty],
            ],
        );
        let err = parse_records(&table).unwrap_err();
        assert!(matches!(err, Error::Format(ref m) if m.starts_with("row 4:")), "{}", err);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let table = RawTable::new(
            headers(),
            vec![
                vec![text("jdoe"), text("IT"), text("1001")],
                vec![text("jdoe2"), text("IT"), text("1001")],
            ],
        );
        assert_eq!(parse_records(&table).unwrap().len(), 2);
    }

    #[test]
    fn test_short_row_without_code() {
        let table = RawTable::new(
            headers(),
            vec![vec![text("jdoe"), text("IT"), text("1001")], vec![text("x")]],
        );
        let err = parse_records(&table).unwrap_err();
        assert!(matches!(err, Error::Format(ref m) if m.contains("row 3")));
    }
}

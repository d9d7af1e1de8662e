//! パイプラインの型定義
//!
//! CLIと各ステージで共有される型:
//! - RawTable / CellValue: 読み込んだ表（ヘッダー + セル）
//! - EmployeeRecord / RecordTable: 社員レコード
//! - UploadedImage / MatchOutcome: 照合の入出力
//! - BackgroundSpec / ProcessedImage: 合成の入出力

use crate::error::{Error, Result};
use crate::layout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 必須列: ユーザー名
pub const USERNAME_COLUMN: &str = "Nombre de usuario";
/// 必須列: 社員コード
pub const EMPLOYEE_CODE_COLUMN: &str = "Código de empleado";

/// 出力画像の拡張子
pub const OUTPUT_EXTENSION: &str = ".jpg";

/// セル値
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 照合キーとして使う文字列表現
    ///
    /// 整数値の数値セルは小数点なしで表示する（`1001.0` → `"1001"`）。
    pub fn key_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_text())
    }
}

/// 読み込んだ表（1行目 = ヘッダー）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// 必須2列以外の列（元の列順を保持）
pub type ExtraFields = Vec<(String, CellValue)>;

/// 社員レコード（スプレッドシートの1行）
///
/// ユーザー名・社員コードはどちらも空でない（`new` で検証）。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    username: String,
    employee_code: String,
    pub extra_fields: ExtraFields,
}

impl EmployeeRecord {
    /// 派生値は保持せず、元の2フィールドから都度計算する
    pub fn new(username: impl Into<String>, employee_code: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let employee_code = employee_code.into();

        if username.trim().is_empty() {
            return Err(Error::Format("username is empty".to_string()));
        }
        if employee_code.trim().is_empty() {
            return Err(Error::Format("employee code is empty".to_string()));
        }

        Ok(Self {
            username,
            employee_code,
            extra_fields: Vec::new(),
        })
    }

    pub fn with_extra_fields(mut self, extra_fields: ExtraFields) -> Self {
        self.extra_fields = extra_fields;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn employee_code(&self) -> &str {
        &self.employee_code
    }

    /// 出力ファイル名 `<username>.jpg`
    pub fn derived_filename(&self) -> String {
        format!("{}{}", self.username, OUTPUT_EXTENSION)
    }

    /// 照合キー `<code>.jpg`（比較は大文字小文字を区別しない）
    pub fn derived_code_key(&self) -> String {
        format!("{}{}", self.employee_code, OUTPUT_EXTENSION)
    }

    pub fn extra_field(&self, name: &str) -> Option<&CellValue> {
        self.extra_fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

/// 解析済みレコード一覧（元の行順）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    pub records: Vec<EmployeeRecord>,
}

impl RecordTable {
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmployeeRecord> {
        self.records.iter()
    }
}

/// アップロードされた写真
///
/// バイト列は `Arc` で共有し、照合・合成で複製も変更もしない。
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    file_name: String,
    bytes: Arc<[u8]>,
}

impl UploadedImage {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// 照合成功（出力名は常にレコードの `derived_filename`）
#[derive(Debug, Clone, PartialEq)]
pub struct Matched {
    image: UploadedImage,
    record: EmployeeRecord,
    new_name: String,
}

impl Matched {
    pub fn new(image: UploadedImage, record: EmployeeRecord) -> Self {
        Self {
            new_name: record.derived_filename(),
            image,
            record,
        }
    }

    pub fn image(&self) -> &UploadedImage {
        &self.image
    }

    pub fn record(&self) -> &EmployeeRecord {
        &self.record
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }
}

/// 照合結果（入力画像1枚につき1つ）
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(Matched),
    Unmatched { image: UploadedImage },
}

impl MatchOutcome {
    pub fn image(&self) -> &UploadedImage {
        match self {
            MatchOutcome::Matched(m) => &m.image,
            MatchOutcome::Unmatched { image } => image,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }
}

/// 定義済み背景色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Palette {
    /// 白 #FFFFFF
    #[default]
    White,
    /// 水色 #E6F0FF
    LightBlue,
    /// 薄灰 #F3F4F6
    LightGray,
}

impl Palette {
    /// パレットID（1〜3）から取得。未知のIDは白
    pub fn from_id(id: u8) -> Self {
        match id {
            2 => Palette::LightBlue,
            3 => Palette::LightGray,
            _ => Palette::White,
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            Palette::White => 1,
            Palette::LightBlue => 2,
            Palette::LightGray => 3,
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        match self {
            Palette::White => layout::WHITE_RGB,
            Palette::LightBlue => layout::LIGHT_BLUE_RGB,
            Palette::LightGray => layout::LIGHT_GRAY_RGB,
        }
    }
}

/// 背景指定
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSpec {
    /// 任意画像（640x480に引き伸ばす）
    Custom(Arc<[u8]>),
    /// 単色
    Palette(Palette),
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        BackgroundSpec::Palette(Palette::White)
    }
}

impl BackgroundSpec {
    pub fn custom(bytes: impl Into<Arc<[u8]>>) -> Self {
        BackgroundSpec::Custom(bytes.into())
    }

    pub fn palette(id: u8) -> Self {
        BackgroundSpec::Palette(Palette::from_id(id))
    }
}

/// 合成済み画像（Compositorのみが生成する）
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    new_name: String,
    encoded_bytes: Vec<u8>,
    source_record: EmployeeRecord,
}

impl ProcessedImage {
    pub(crate) fn new(new_name: String, encoded_bytes: Vec<u8>, source_record: EmployeeRecord) -> Self {
        Self {
            new_name,
            encoded_bytes,
            source_record,
        }
    }

    pub fn new_name(&self) -> &str {
        &self.new_name
    }

    pub fn encoded_bytes(&self) -> &[u8] {
        &self.encoded_bytes
    }

    pub fn source_record(&self) -> &EmployeeRecord {
        &self.source_record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_names() {
        let record = EmployeeRecord::new("jdoe", "1001").unwrap();
        assert_eq!(record.derived_filename(), "jdoe.jpg");
        assert_eq!(record.derived_code_key(), "1001.jpg");
    }

    #[test]
    fn test_record_requires_both_fields() {
        assert!(matches!(EmployeeRecord::new("", "1001"), Err(Error::Format(_))));
        assert!(matches!(EmployeeRecord::new("jdoe", "  "), Err(Error::Format(_))));
    }

    #[test]
    fn test_matched_name_follows_record() {
        let record = EmployeeRecord::new("jdoe", "1001").unwrap();
        let matched = Matched::new(UploadedImage::new("1001.png", vec![0u8]), record);
        assert_eq!(matched.new_name(), "jdoe.jpg");
        assert_eq!(matched.new_name(), matched.record().derived_filename());
        assert_eq!(matched.image().file_name(), "1001.png");
    }

    #[test]
    fn test_key_text_number() {
        assert_eq!(CellValue::Number(1001.0).key_text(), "1001");
        assert_eq!(CellValue::Number(12.5).key_text(), "12.5");
        assert_eq!(CellValue::Text("  abc ".into()).key_text(), "abc");
        assert_eq!(CellValue::Empty.key_text(), "");
    }

    #[test]
    fn test_cell_is_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text("   ".into()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_palette_from_id() {
        assert_eq!(Palette::from_id(1), Palette::White);
        assert_eq!(Palette::from_id(2), Palette::LightBlue);
        assert_eq!(Palette::from_id(3), Palette::LightGray);
        assert_eq!(Palette::from_id(9), Palette::White);
        assert_eq!(BackgroundSpec::default(), BackgroundSpec::Palette(Palette::White));
    }

    #[test]
    fn test_column_index_trims_header() {
        let table = RawTable::new(vec![" Nombre de usuario ".into()], vec![]);
        assert_eq!(table.column_index(USERNAME_COLUMN), Some(0));
    }
}

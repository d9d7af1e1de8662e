//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// スプレッドシートの形式不正（後続処理をすべて止める）
    #[error("Format error: {0}")]
    Format(String),

    /// 画像または背景をデコードできない（その1件のみ失敗扱い）
    #[error("Decode error: {name}: {message}")]
    Decode { name: String, message: String },

    #[error("Encode error: {0}")]
    Encode(String),

    /// アーカイブ作成失敗（エクスポートのみ失敗、合成結果は有効）
    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

impl Error {
    pub fn decode(name: impl Into<String>, message: impl ToString) -> Self {
        Error::Decode {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Archive(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Error::Spreadsheet(e.to_string())
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoOnboardError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像ファイルではありません: {0}")]
    UnsupportedImage(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("スプレッドシートを読み込めません: {0}")]
    Workbook(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] photo_onboard_common::Error),
}

impl PhotoOnboardError {
    /// スプレッドシート起因のエラー（以降の処理をすべて止める）か
    pub fn is_spreadsheet_error(&self) -> bool {
        matches!(
            self,
            PhotoOnboardError::Workbook(_)
                | PhotoOnboardError::Common(photo_onboard_common::Error::Format(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, PhotoOnboardError>;

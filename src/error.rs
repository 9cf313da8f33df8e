use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaLibraryError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("不正なパス: {0}")]
    InvalidPath(String),

    #[error("不正な入力データ: {0}")]
    InvalidInput(String),

    #[error("編集セッションが見つかりません: {0}")]
    SessionNotFound(String),

    #[error("ストレージエラー: {0}")]
    Storage(String),

    #[error("リサイズエラー: {0}")]
    Resize(#[from] image::ImageError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MediaLibraryError>;

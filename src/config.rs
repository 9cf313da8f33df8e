use crate::error::{MediaLibraryError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// メディアライブラリのルートディレクトリ
    pub library_root: PathBuf,
    /// サムネイル・編集セッションの作業ルート
    pub thumb_root: PathBuf,
    /// ライブラリ公開URLの基底
    pub media_url_base: String,
    /// サムネイル公開URLの基底
    pub thumb_url_base: String,
    /// アップロード名を常にスラグ化する
    pub auto_rename_slug: bool,
    /// 閲覧状態ファイルの保存先
    pub state_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MediaLibraryError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("media-library").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            library_root: PathBuf::from("media"),
            thumb_root: PathBuf::from("media-thumbs"),
            media_url_base: "/storage/media".into(),
            thumb_url_base: "/storage/temp/public".into(),
            auto_rename_slug: false,
            state_dir: PathBuf::from("media-thumbs").join("state"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

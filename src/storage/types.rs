//! ライブラリ項目の型定義
//!
//! 一覧・検索の結果として返される項目。ストレージアダプタから毎回
//! 再計算され、単独では永続化されない。

use crate::path;
use serde::{Deserialize, Serialize};

/// 項目種別（ファイル/フォルダ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    File,
    Folder,
}

/// ファイル種別（拡張子から分類）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "avif", "ico",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "avi", "mov", "mpg", "mpeg", "webm", "mkv", "ogv",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "ogg", "m4a", "flac", "aac", "wma",
];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "txt",
    "md", "csv", "rtf",
];

impl FileType {
    /// パスの拡張子からファイル種別を判定する
    pub fn from_path(path: &str) -> Self {
        let ext = path::extension(path);
        let ext = ext.as_str();

        if IMAGE_EXTENSIONS.contains(&ext) {
            FileType::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            FileType::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            FileType::Audio
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            FileType::Document
        } else {
            FileType::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Video => "video",
            FileType::Audio => "audio",
            FileType::Document => "document",
            FileType::Other => "other",
        }
    }
}

/// ライブラリ項目
///
/// `path` はライブラリルートからの仮想パス（`/` 始まり）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryItem {
    pub path: String,
    pub item_type: ItemType,
    pub file_type: FileType,
    /// 最終更新時刻（UNIX秒）
    pub last_modified: i64,
    /// バイト数（フォルダは0）
    pub size: u64,
}

impl LibraryItem {
    /// 表示名（パスの末尾セグメント）
    pub fn title(&self) -> &str {
        path::base_name(&self.path)
    }
}

/// ソート列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Title,
    Size,
    Modified,
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "title" => Ok(SortBy::Title),
            "size" => Ok(SortBy::Size),
            "modified" => Ok(SortBy::Modified),
            _ => Err(format!("Unknown sort column: {}. Use title, size, or modified", s)),
        }
    }
}

/// ソート方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {}. Use asc or desc", s)),
        }
    }
}

/// 一覧・検索のソート指定
#[derive(Debug, Clone, Copy, Default)]
pub struct SortOptions {
    pub by: SortBy,
    pub direction: SortDirection,
}

impl SortOptions {
    pub fn new(by: SortBy, direction: SortDirection) -> Self {
        Self { by, direction }
    }

    /// 項目列をソートする（フォルダ/ファイルの並びは呼び出し側が管理）
    pub fn sort(&self, items: &mut [LibraryItem]) {
        items.sort_by(|a, b| {
            let ordering = match self.by {
                SortBy::Title => a.title().to_lowercase().cmp(&b.title().to_lowercase()),
                SortBy::Size => a.size.cmp(&b.size),
                SortBy::Modified => a.last_modified.cmp(&b.last_modified),
            };

            match self.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }
}

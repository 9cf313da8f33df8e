//! アップロードファイルの検証
//!
//! 拡張子のホワイトリスト検査と、非ラテン文字等を含むファイル名の
//! スラグ化を提供する。

use crate::path;
use lazy_static::lazy_static;
use regex::Regex;

/// 受け入れる拡張子（既定セット）
const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "bmp", "png", "webp", "gif", "svg", "avif", "ico",
    "mp4", "m4v", "avi", "mov", "mpg", "mpeg", "webm", "mkv", "ogv",
    "mp3", "m4a", "wav", "ogg", "flac", "aac",
    "pdf", "doc", "docx", "ppt", "pptx", "xls", "xlsx", "odt", "ods",
    "txt", "md", "csv", "rtf", "ics",
    "css", "less", "scss", "js", "map", "json",
    "zip", "rar", "7z", "gz",
    "eot", "otf", "ttf", "woff", "woff2",
];

lazy_static! {
    // スラグに残す文字以外
    static ref INVALID_CHAR_RE: Regex = Regex::new(r"[^a-z0-9@\s\-]+").unwrap();
    // セパレータと空白の連続
    static ref SEPARATOR_RE: Regex = Regex::new(r"[\s\-]+").unwrap();
}

/// 拡張子が受け入れ対象かどうか
pub fn validate_file_type(name: &str) -> bool {
    let ext = path::extension(name);
    ALLOWED_EXTENSIONS.contains(&ext.as_str())
}

/// ファイル名の基部をスラグ化する（`@` は保持）
pub fn slug_file_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('_', "-");
    let cleaned = INVALID_CHAR_RE.replace_all(&lowered, "");
    let collapsed = SEPARATOR_RE.replace_all(&cleaned, "-");

    collapsed.trim_matches('-').to_string()
}

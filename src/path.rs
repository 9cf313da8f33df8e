//! ライブラリパス検証モジュール
//!
//! ユーザ入力のフォルダ/ファイルパスを正規化し、ライブラリルート外への
//! 到達（`..`等のトラバーサル）や不正文字を拒否する。
//! ストレージやファイルシステムに触れる前に必ずここを通すこと。

use crate::error::{MediaLibraryError, Result};
use lazy_static::lazy_static;
use regex::Regex;

/// ライブラリのルートフォルダ
pub const FOLDER_ROOT: &str = "/";

lazy_static! {
    // 1セグメントに許可する文字（英数字・Unicode文字・@ . 空白 _ -）
    static ref SEGMENT_RE: Regex = Regex::new(r"^[\w@.\s\-]+$").unwrap();
    // 編集セッションキーの形式
    static ref SESSION_KEY_RE: Regex = Regex::new(r"^[0-9a-z]+$").unwrap();
}

/// パスを正規化する
///
/// - バックスラッシュを `/` に統一
/// - 連続・末尾のセパレータを除去
/// - 先頭に `/` を付与（ルートは `/` のまま）
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let segments: Vec<&str> = unified
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        return FOLDER_ROOT.to_string();
    }

    format!("/{}", segments.join("/"))
}

/// パスを検証して正規化形式を返す
///
/// トラバーサルシーケンスや不正文字を含む場合は `InvalidPath` で失敗する。
/// `allow_root` が false の場合、ルート `/` 自体も拒否する。
pub fn validate(path: &str, allow_root: bool) -> Result<String> {
    if path.chars().any(|c| c.is_control()) {
        return Err(MediaLibraryError::InvalidPath(path.to_string()));
    }

    let normalized = normalize(path);

    if normalized == FOLDER_ROOT {
        if allow_root {
            return Ok(normalized);
        }
        return Err(MediaLibraryError::InvalidPath(path.to_string()));
    }

    for segment in normalized.trim_start_matches('/').split('/') {
        if segment == ".." || segment == "." || !SEGMENT_RE.is_match(segment) {
            return Err(MediaLibraryError::InvalidPath(path.to_string()));
        }
    }

    Ok(normalized)
}

/// ファイル名（1セグメント）を検証する
///
/// セパレータや `..` を含む名前は不可。
pub fn validate_file_name(name: &str) -> bool {
    if name.is_empty() || name.contains("..") {
        return false;
    }

    SEGMENT_RE.is_match(name)
}

/// 編集セッションキーを検証する
pub fn validate_session_key(key: &str) -> Result<()> {
    if SESSION_KEY_RE.is_match(key) {
        Ok(())
    } else {
        Err(MediaLibraryError::InvalidInput(format!(
            "セッションキーが不正です: {}",
            key
        )))
    }
}

/// 拡張子を小文字で返す（なければ空文字）
pub fn extension(path: &str) -> String {
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(stem, ext)| {
            if stem.is_empty() {
                String::new()
            } else {
                ext.to_lowercase()
            }
        })
        .unwrap_or_default()
}

/// ベクタ画像（SVG）かどうか
pub fn is_vector(path: &str) -> bool {
    extension(path) == "svg"
}

/// 仮想パスを連結して正規化する
pub fn join(base: &str, name: &str) -> String {
    normalize(&format!("{}/{}", base, name))
}

/// パスの末尾セグメントを返す
pub fn base_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// 親フォルダのパスを返す（ルートの親はルート）
pub fn parent(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) | None => FOLDER_ROOT.to_string(),
        Some(pos) => normalized[..pos].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("library/photos"), "/library/photos");
        assert_eq!(normalize("/library//photos/"), "/library/photos");
        assert_eq!(normalize("\\library\\photos"), "/library/photos");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("///"), "/");
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(validate("/library/photos", false).unwrap(), "/library/photos");
        assert_eq!(validate("library/photos/", false).unwrap(), "/library/photos");
        assert_eq!(validate("/", true).unwrap(), "/");
    }

    #[test]
    fn test_validate_traversal() {
        assert!(validate("../../etc/passwd", false).is_err());
        assert!(validate("/library/../etc", false).is_err());
        assert!(validate("/library/./photos", false).is_err());
    }

    #[test]
    fn test_validate_root_not_allowed() {
        assert!(validate("/", false).is_err());
        assert!(validate("", false).is_err());
    }

    #[test]
    fn test_validate_bad_characters() {
        assert!(validate("/library/pho*tos", false).is_err());
        assert!(validate("/library/pho\0tos", false).is_err());
        assert!(validate("/library/pho?tos", false).is_err());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("photo-01.jpg"));
        assert!(validate_file_name("写真 @2024.png"));
        assert!(!validate_file_name("../photo.jpg"));
        assert!(!validate_file_name("a/b.jpg"));
        assert!(!validate_file_name(""));
    }

    #[test]
    fn test_validate_session_key() {
        assert!(validate_session_key("a1b2c3").is_ok());
        assert!(validate_session_key("ABC").is_err());
        assert!(validate_session_key("a-b").is_err());
        assert!(validate_session_key("").is_err());
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("/a/photo.JPG"), "jpg");
        assert_eq!(extension("/a/archive.tar.gz"), "gz");
        assert_eq!(extension("/a/noext"), "");
        assert_eq!(extension("/a/.hidden"), "");
    }

    #[test]
    fn test_is_vector() {
        assert!(is_vector("/icons/logo.svg"));
        assert!(is_vector("/icons/logo.SVG"));
        assert!(!is_vector("/icons/logo.png"));
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/library", "photos"), "/library/photos");
        assert_eq!(join("/", "cropped-images"), "/cropped-images");
    }

    #[test]
    fn test_base_name_and_parent() {
        assert_eq!(base_name("/library/photos/a.jpg"), "a.jpg");
        assert_eq!(parent("/library/photos/a.jpg"), "/library/photos");
        assert_eq!(parent("/library"), "/");
        assert_eq!(parent("/"), "/");
    }
}

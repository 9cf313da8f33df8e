//! メディアライブラリ閲覧・サムネイルキャッシュエンジン
//!
//! リモート/ローカルのメディアストアを抽象化し、フォルダ閲覧・検索、
//! 決定的キーによるサムネイルキャッシュ、画像編集セッション、
//! セッション所有の閲覧状態を提供する。

pub mod browse;
pub mod cli;
pub mod config;
pub mod crop;
pub mod error;
pub mod events;
pub mod path;
pub mod resizer;
pub mod storage;
pub mod thumbnail;
pub mod upload;

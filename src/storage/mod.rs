//! ライブラリストレージアダプタ
//!
//! リモート/ローカルのメディアストアを抽象化するケーパビリティ
//! インターフェース。コア側はストレージ実装を持たず、この境界を
//! 通してのみファイルに触れる。

mod local;
mod types;

pub use local::LocalStorage;
pub use types::{FileType, ItemType, LibraryItem, SortBy, SortDirection, SortOptions};

use crate::error::Result;
use std::path::Path;

/// メディアストアの操作境界
///
/// パスはすべて検証済みの仮想ライブラリパス（`/` 始まり）を前提とする。
pub trait LibraryStorage {
    /// フォルダ直下の項目一覧（フォルダ→ファイルの順、各ソート済み）
    fn list(
        &self,
        folder: &str,
        sort: &SortOptions,
        filter: Option<FileType>,
    ) -> Result<Vec<LibraryItem>>;

    /// ライブラリ全体からファイル名で検索（ファイルのみ）
    fn find(
        &self,
        term: &str,
        sort: &SortOptions,
        filter: Option<FileType>,
    ) -> Result<Vec<LibraryItem>>;

    /// 全フォルダのパス一覧（移動先選択用）。`exclude` 配下は除く。
    fn list_all_folders(&self, exclude: &[String]) -> Result<Vec<String>>;

    /// ファイル内容を取得する
    fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// ファイル内容を書き込む（親フォルダは作成される）
    fn put(&self, path: &str, data: &[u8]) -> Result<()>;

    /// ローカルファイルをライブラリへ取り込む
    fn put_file(&self, path: &str, local: &Path) -> Result<()>;

    fn move_file(&self, src: &str, dst: &str) -> Result<()>;

    fn move_folder(&self, src: &str, dst: &str) -> Result<()>;

    /// 複数ファイルを一括削除する
    fn delete_files(&self, paths: &[String]) -> Result<()>;

    /// フォルダを再帰的に削除する
    fn delete_folder(&self, path: &str) -> Result<()>;

    fn make_folder(&self, path: &str) -> Result<()>;

    /// ファイルが存在するか
    fn has(&self, path: &str) -> Result<bool>;

    fn folder_exists(&self, path: &str) -> Result<bool>;

    /// 一覧キャッシュを破棄する
    fn reset_cache(&self);

    /// 公開URLを返す
    fn url(&self, path: &str) -> String;
}

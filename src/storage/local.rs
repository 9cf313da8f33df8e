//! ローカルファイルシステム実装
//!
//! ライブラリルート配下のディレクトリツリーをメディアストアとして
//! 公開する。フォルダ一覧はインスタンス内にキャッシュされ、
//! `reset_cache` で破棄される。

use super::types::{FileType, ItemType, LibraryItem, SortOptions};
use super::LibraryStorage;
use crate::error::{MediaLibraryError, Result};
use crate::path as lib_path;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

pub struct LocalStorage {
    root: PathBuf,
    url_base: String,
    list_cache: RefCell<HashMap<String, Vec<LibraryItem>>>,
}

impl LocalStorage {
    /// ルートディレクトリを指定して開く（なければ作成）
    pub fn open(root: impl Into<PathBuf>, url_base: impl Into<String>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            url_base: url_base.into(),
            list_cache: RefCell::new(HashMap::new()),
        })
    }

    /// 仮想パスをファイルシステムパスへ変換する
    fn fs_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    /// ファイルシステムパスを仮想パスへ戻す
    fn virtual_path(&self, fs_path: &Path) -> String {
        let relative = fs_path.strip_prefix(&self.root).unwrap_or(fs_path);
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        format!("/{}", joined)
    }

    fn item_from_entry(&self, entry_path: &Path) -> Result<LibraryItem> {
        let metadata = fs::metadata(entry_path)?;
        let virtual_path = self.virtual_path(entry_path);

        let last_modified = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        if metadata.is_dir() {
            Ok(LibraryItem {
                path: virtual_path,
                item_type: ItemType::Folder,
                file_type: FileType::Other,
                last_modified,
                size: 0,
            })
        } else {
            Ok(LibraryItem {
                file_type: FileType::from_path(&virtual_path),
                path: virtual_path,
                item_type: ItemType::File,
                last_modified,
                size: metadata.len(),
            })
        }
    }

    /// フォルダ直下の生一覧（キャッシュ対象、未ソート・未フィルタ）
    fn raw_list(&self, folder: &str) -> Result<Vec<LibraryItem>> {
        if let Some(cached) = self.list_cache.borrow().get(folder) {
            return Ok(cached.clone());
        }

        let dir = self.fs_path(folder);
        if !dir.is_dir() {
            return Err(MediaLibraryError::Storage(format!(
                "フォルダが見つかりません: {}",
                folder
            )));
        }

        let mut items = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            items.push(self.item_from_entry(entry.path())?);
        }

        self.list_cache
            .borrow_mut()
            .insert(folder.to_string(), items.clone());

        Ok(items)
    }
}

impl LibraryStorage for LocalStorage {
    fn list(
        &self,
        folder: &str,
        sort: &SortOptions,
        filter: Option<FileType>,
    ) -> Result<Vec<LibraryItem>> {
        let items = self.raw_list(folder)?;

        // フォルダは常に先頭、ファイルはフィルタ適用後に続ける
        let (mut folders, mut files): (Vec<_>, Vec<_>) = items
            .into_iter()
            .partition(|i| i.item_type == ItemType::Folder);

        if let Some(file_type) = filter {
            files.retain(|i| i.file_type == file_type);
        }

        sort.sort(&mut folders);
        sort.sort(&mut files);

        folders.append(&mut files);
        Ok(folders)
    }

    fn find(
        &self,
        term: &str,
        sort: &SortOptions,
        filter: Option<FileType>,
    ) -> Result<Vec<LibraryItem>> {
        let needle = term.to_lowercase();
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.contains(&needle) {
                continue;
            }

            let item = self.item_from_entry(entry.path())?;
            if let Some(file_type) = filter {
                if item.file_type != file_type {
                    continue;
                }
            }

            files.push(item);
        }

        sort.sort(&mut files);
        Ok(files)
    }

    fn list_all_folders(&self, exclude: &[String]) -> Result<Vec<String>> {
        let mut folders = vec![lib_path::FOLDER_ROOT.to_string()];

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_dir() {
                continue;
            }

            let virtual_path = self.virtual_path(entry.path());
            let excluded = exclude
                .iter()
                .any(|e| virtual_path == *e || virtual_path.starts_with(&format!("{}/", e)));

            if !excluded {
                folders.push(virtual_path);
            }
        }

        folders.sort();
        Ok(folders)
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.fs_path(path))?)
    }

    fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let target = self.fs_path(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(target, data)?;
        Ok(())
    }

    fn put_file(&self, path: &str, local: &Path) -> Result<()> {
        let target = self.fs_path(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::copy(local, target)?;
        Ok(())
    }

    fn move_file(&self, src: &str, dst: &str) -> Result<()> {
        let target = self.fs_path(dst);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::rename(self.fs_path(src), target)?;
        Ok(())
    }

    fn move_folder(&self, src: &str, dst: &str) -> Result<()> {
        self.move_file(src, dst)
    }

    fn delete_files(&self, paths: &[String]) -> Result<()> {
        for path in paths {
            fs::remove_file(self.fs_path(path))?;
        }

        Ok(())
    }

    fn delete_folder(&self, path: &str) -> Result<()> {
        fs::remove_dir_all(self.fs_path(path))?;
        Ok(())
    }

    fn make_folder(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.fs_path(path))?;
        Ok(())
    }

    fn has(&self, path: &str) -> Result<bool> {
        Ok(self.fs_path(path).is_file())
    }

    fn folder_exists(&self, path: &str) -> Result<bool> {
        Ok(self.fs_path(path).is_dir())
    }

    fn reset_cache(&self) {
        self.list_cache.borrow_mut().clear();
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.url_base.trim_end_matches('/'), path)
    }
}

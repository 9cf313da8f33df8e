//! サムネイルキャッシュ機能テスト
//!
//! 決定的キーによる冪等な生成と、失敗時の壊れ画像マーカーを検証

use media_library_rust::error::Result;
use media_library_rust::resizer::ResizeMode;
use media_library_rust::storage::{FileType, LibraryItem, LibraryStorage, LocalStorage, SortOptions};
use media_library_rust::thumbnail::{ThumbnailCache, ThumbnailParams};
use std::cell::Cell;
use std::path::Path;
use tempfile::tempdir;

/// ストレージへのアクセス回数を数えるラッパー
struct CountingStorage {
    inner: LocalStorage,
    gets: Cell<usize>,
}

impl CountingStorage {
    fn new(inner: LocalStorage) -> Self {
        Self {
            inner,
            gets: Cell::new(0),
        }
    }
}

impl LibraryStorage for CountingStorage {
    fn list(
        &self,
        folder: &str,
        sort: &SortOptions,
        filter: Option<FileType>,
    ) -> Result<Vec<LibraryItem>> {
        self.inner.list(folder, sort, filter)
    }

    fn find(
        &self,
        term: &str,
        sort: &SortOptions,
        filter: Option<FileType>,
    ) -> Result<Vec<LibraryItem>> {
        self.inner.find(term, sort, filter)
    }

    fn list_all_folders(&self, exclude: &[String]) -> Result<Vec<String>> {
        self.inner.list_all_folders(exclude)
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.gets.set(self.gets.get() + 1);
        self.inner.get(path)
    }

    fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        self.inner.put(path, data)
    }

    fn put_file(&self, path: &str, local: &Path) -> Result<()> {
        self.inner.put_file(path, local)
    }

    fn move_file(&self, src: &str, dst: &str) -> Result<()> {
        self.inner.move_file(src, dst)
    }

    fn move_folder(&self, src: &str, dst: &str) -> Result<()> {
        self.inner.move_folder(src, dst)
    }

    fn delete_files(&self, paths: &[String]) -> Result<()> {
        self.inner.delete_files(paths)
    }

    fn delete_folder(&self, path: &str) -> Result<()> {
        self.inner.delete_folder(path)
    }

    fn make_folder(&self, path: &str) -> Result<()> {
        self.inner.make_folder(path)
    }

    fn has(&self, path: &str) -> Result<bool> {
        self.inner.has(path)
    }

    fn folder_exists(&self, path: &str) -> Result<bool> {
        self.inner.folder_exists(path)
    }

    fn reset_cache(&self) {
        self.inner.reset_cache()
    }

    fn url(&self, path: &str) -> String {
        self.inner.url(path)
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::RgbImage::new(width, height)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
    bytes
}

fn setup(source_width: u32, source_height: u32) -> (tempfile::TempDir, CountingStorage, ThumbnailCache) {
    let dir = tempdir().expect("Failed to create temp dir");

    let media_root = dir.path().join("media");
    let storage = LocalStorage::open(&media_root, "/storage/media").unwrap();
    storage
        .put("/a.png", &png_bytes(source_width, source_height))
        .unwrap();

    let cache = ThumbnailCache::open(dir.path().join("thumbs"), "/storage/temp/public").unwrap();

    (dir, CountingStorage::new(storage), cache)
}

/// 生成とキャッシュヒットの冪等性
#[test]
fn test_ensure_idempotent() {
    let (_dir, storage, cache) = setup(500, 300);
    let params = ThumbnailParams::new(165, 165, ResizeMode::Crop);

    let first = cache.ensure(&storage, "/a.png", 1000, &params).unwrap();
    assert!(!first.broken);
    assert_eq!(storage.gets.get(), 1);

    let thumb_path = first.cache_path.clone().expect("キャッシュパスがない");
    assert!(thumb_path.is_file());
    assert_eq!(image::image_dimensions(&thumb_path).unwrap(), (165, 165));

    // 2回目は元ストレージへ触れずに同じパスを返す
    let second = cache.ensure(&storage, "/a.png", 1000, &params).unwrap();
    assert_eq!(storage.gets.get(), 1);
    assert_eq!(second.cache_path, first.cache_path);
    assert_eq!(second.url, first.url);
    assert!(!second.broken);
}

/// 更新時刻が変わると別のキーで再生成される
#[test]
fn test_ensure_new_key_on_modified() {
    let (_dir, storage, cache) = setup(500, 300);
    let params = ThumbnailParams::new(165, 165, ResizeMode::Crop);

    let first = cache.ensure(&storage, "/a.png", 1000, &params).unwrap();
    let second = cache.ensure(&storage, "/a.png", 2000, &params).unwrap();

    assert_ne!(first.cache_path, second.cache_path);
    assert_eq!(storage.gets.get(), 2);
}

/// 要求枠より小さい元画像は拡大しない
#[test]
fn test_ensure_never_upscales() {
    let (_dir, storage, cache) = setup(100, 60);
    let params = ThumbnailParams::new(165, 165, ResizeMode::Crop);

    let thumb = cache.ensure(&storage, "/a.png", 1000, &params).unwrap();
    let thumb_path = thumb.cache_path.unwrap();

    assert_eq!(image::image_dimensions(&thumb_path).unwrap(), (100, 60));
}

/// ベクタ画像はリサイズせず元URLを返す
#[test]
fn test_ensure_svg_bypass() {
    let (_dir, storage, cache) = setup(500, 300);
    storage.put("/logo.svg", b"<svg></svg>").unwrap();
    let params = ThumbnailParams::new(165, 165, ResizeMode::Crop);

    let before = storage.gets.get();
    let thumb = cache.ensure(&storage, "/logo.svg", 1000, &params).unwrap();

    assert_eq!(thumb.url, "/storage/media/logo.svg");
    assert!(thumb.cache_path.is_none());
    assert!(!thumb.broken);
    assert_eq!(storage.gets.get(), before);
}

/// 取得失敗は壊れ画像マーカーになり、再試行もしない
#[test]
fn test_ensure_broken_marker_on_failure() {
    let (_dir, storage, cache) = setup(500, 300);
    let params = ThumbnailParams::new(165, 165, ResizeMode::Crop);

    let thumb = cache.ensure(&storage, "/missing.png", 1000, &params).unwrap();
    assert!(thumb.broken);
    assert!(cache.is_error(&thumb));

    let thumb_path = thumb.cache_path.clone().unwrap();
    assert!(thumb_path.is_file());

    // マーカーが残っている間はキャッシュヒット扱いで再生成しない
    let gets = storage.gets.get();
    let again = cache.ensure(&storage, "/missing.png", 1000, &params).unwrap();
    assert!(again.broken);
    assert_eq!(storage.gets.get(), gets);
}

/// 画像でないデータはリサイズに失敗して壊れ画像マーカーになる
#[test]
fn test_ensure_broken_marker_on_bad_image() {
    let (_dir, storage, cache) = setup(500, 300);
    storage.put("/fake.png", b"not an image at all").unwrap();
    let params = ThumbnailParams::new(165, 165, ResizeMode::Crop);

    let thumb = cache.ensure(&storage, "/fake.png", 1000, &params).unwrap();
    assert!(thumb.broken);
    assert!(cache.is_error(&thumb));
}

/// 入力検証はI/Oの前に行われる
#[test]
fn test_ensure_rejects_invalid_input() {
    let (_dir, storage, cache) = setup(500, 300);

    let params = ThumbnailParams::new(165, 165, ResizeMode::Crop);
    assert!(cache.ensure(&storage, "../etc/passwd", 1000, &params).is_err());

    let zero = ThumbnailParams::new(0, 165, ResizeMode::Crop);
    assert!(cache.ensure(&storage, "/a.png", 1000, &zero).is_err());

    assert_eq!(storage.gets.get(), 0);
}

/// 作業用一時ファイルは成功時に削除される
#[test]
fn test_temp_files_cleaned_up() {
    let (_dir, storage, cache) = setup(500, 300);
    let params = ThumbnailParams::new(165, 165, ResizeMode::Crop);

    cache.ensure(&storage, "/a.png", 1000, &params).unwrap();

    let temp_dir = cache.root().join("media");
    let leftovers = std::fs::read_dir(&temp_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

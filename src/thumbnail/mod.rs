//! サムネイルキャッシュモジュール
//!
//! パス・更新時刻・寸法・モードから決定的なキャッシュキーを導出し、
//! ミス時のみ取得とリサイズを行う。生成失敗は壊れ画像マーカーで
//! 埋めてログに残し、呼び出し元へはエラーを返さない。

use crate::error::{MediaLibraryError, Result};
use crate::path;
use crate::resizer::{ResizeMode, Resizer};
use crate::storage::LibraryStorage;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// 生成失敗時にキャッシュへ書き込む壊れ画像マーカー（1x1 GIF）
const BROKEN_IMAGE: &[u8] =
    b"GIF89a\x01\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";

/// サムネイル生成パラメータ
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailParams {
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
}

impl ThumbnailParams {
    pub fn new(width: u32, height: u32, mode: ResizeMode) -> Self {
        Self { width, height, mode }
    }
}

/// 生成済みサムネイルへの参照
///
/// `cache_path` はベクタ画像（リサイズ対象外）の場合は持たない。
#[derive(Debug, Clone)]
pub struct ThumbnailRef {
    pub url: String,
    pub cache_path: Option<PathBuf>,
    pub broken: bool,
}

pub struct ThumbnailCache {
    root: PathBuf,
    url_base: String,
}

impl ThumbnailCache {
    /// キャッシュルートを指定して開く（なければ作成）
    pub fn open(root: impl Into<PathBuf>, url_base: impl Into<String>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            url_base: url_base.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// サムネイルを保証する
    ///
    /// キャッシュキーにファイルが既にあれば元ストレージへは触れずに
    /// 返す。ミス時は取得→リサイズ→キャッシュ書き込みを行う。
    /// 生成に失敗した場合は壊れ画像マーカーを書き込み、`broken` を
    /// 立てた参照を返す（エラーにはしない）。
    pub fn ensure(
        &self,
        storage: &dyn LibraryStorage,
        item_path: &str,
        last_modified: i64,
        params: &ThumbnailParams,
    ) -> Result<ThumbnailRef> {
        let item_path = path::validate(item_path, false)?;

        if params.width == 0 || params.height == 0 {
            return Err(MediaLibraryError::InvalidInput(
                "サムネイル寸法は1以上を指定してください".to_string(),
            ));
        }

        // ベクタ画像はリサイズせず元URLをそのまま返す
        if path::is_vector(&item_path) {
            return Ok(ThumbnailRef {
                url: storage.url(&item_path),
                cache_path: None,
                broken: false,
            });
        }

        let relative = self.cache_relative_path(&item_path, last_modified, params);
        let full = self.root.join(&relative);

        // キャッシュヒット: 元ストレージへのI/Oなしで返す
        if full.is_file() {
            return Ok(ThumbnailRef {
                url: self.url_for(&relative),
                broken: is_broken_thumbnail(&full),
                cache_path: Some(full),
            });
        }

        match self.generate(storage, &item_path, &full, params) {
            Ok(()) => Ok(ThumbnailRef {
                url: self.url_for(&relative),
                cache_path: Some(full),
                broken: false,
            }),
            Err(err) => {
                log::warn!("サムネイル生成に失敗しました ({}): {}", item_path, err);
                self.write_broken_marker(&full);

                Ok(ThumbnailRef {
                    url: self.url_for(&relative),
                    cache_path: Some(full),
                    broken: true,
                })
            }
        }
    }

    /// キャッシュ済みファイルが壊れ画像マーカーかどうか
    pub fn is_error(&self, thumbnail: &ThumbnailRef) -> bool {
        thumbnail.broken
            || thumbnail
                .cache_path
                .as_deref()
                .map(is_broken_thumbnail)
                .unwrap_or(false)
    }

    /// キャッシュルートからの相対パスを導出する（入力の純関数）
    ///
    /// `<3階層パーティション>/thumb_<署名>_<幅>x<高さ>_<モード>.<拡張子>`
    pub fn cache_relative_path(
        &self,
        item_path: &str,
        last_modified: i64,
        params: &ThumbnailParams,
    ) -> String {
        let signature = item_signature(item_path, last_modified);
        let partition = format!(
            "{}/{}/{}",
            &signature[0..3],
            &signature[3..6],
            &signature[6..9]
        );

        format!(
            "{}/thumb_{}_{}x{}_{}.{}",
            partition,
            signature,
            params.width,
            params.height,
            params.mode,
            thumbnail_extension(item_path)
        )
    }

    fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.url_base.trim_end_matches('/'), relative)
    }

    fn generate(
        &self,
        storage: &dyn LibraryStorage,
        item_path: &str,
        full: &Path,
        params: &ThumbnailParams,
    ) -> Result<()> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }

        // 元ファイルを一時領域へ取得してからリサイズする
        let temp = self.temp_file_path(item_path);
        if let Some(parent) = temp.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&temp, storage.get(item_path)?)?;

        let result = self.resize_to_cache(&temp, full, params);
        let _ = fs::remove_file(&temp);
        result
    }

    fn resize_to_cache(&self, source: &Path, full: &Path, params: &ThumbnailParams) -> Result<()> {
        let (width, height) = target_dimensions(params.width, params.height, source);

        Resizer::open(source)?
            .resize(width, height, params.mode)
            .save(full)
    }

    /// 作業用一時ファイルのパス（呼び出しごとに一意）
    fn temp_file_path(&self, item_path: &str) -> PathBuf {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default();
        let digest = Sha256::digest(format!("{}{}", item_path, nanos));

        self.root.join("media").join(&hex::encode(digest)[..32])
    }

    fn write_broken_marker(&self, full: &Path) {
        if let Some(parent) = full.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }

        if let Err(err) = fs::write(full, BROKEN_IMAGE) {
            log::warn!("壊れ画像マーカーの書き込みに失敗しました: {}", err);
        }
    }
}

/// 項目の署名（パスのハッシュ + 更新時刻、入力の純関数）
fn item_signature(item_path: &str, last_modified: i64) -> String {
    let digest = Sha256::digest(item_path.as_bytes());
    format!("{}{}", &hex::encode(digest)[..32], last_modified)
}

/// キャッシュファイルの拡張子（png/gif/webpは維持、他はjpg）
fn thumbnail_extension(item_path: &str) -> String {
    let ext = path::extension(item_path);
    match ext.as_str() {
        "png" | "gif" | "webp" => ext,
        _ => "jpg".to_string(),
    }
}

/// 目標寸法を算出する
///
/// 元画像が要求枠より小さければ元寸法を維持する（拡大しない）。
/// 寸法が読めない場合は要求値をそのまま使う。
fn target_dimensions(width: u32, height: u32, source: &Path) -> (u32, u32) {
    match image::image_dimensions(source) {
        Ok((source_width, source_height)) => {
            if source_width > width || source_height > height {
                (width, height)
            } else {
                (source_width, source_height)
            }
        }
        Err(_) => (width, height),
    }
}

/// ファイル内容が壊れ画像マーカーと一致するか
fn is_broken_thumbnail(full: &Path) -> bool {
    match fs::metadata(full) {
        Ok(meta) if meta.len() == BROKEN_IMAGE.len() as u64 => fs::read(full)
            .map(|data| data == BROKEN_IMAGE)
            .unwrap_or(false),
        _ => false,
    }
}

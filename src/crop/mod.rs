//! 画像編集セッション管理モジュール
//!
//! セッションキーごとにサムネイルルート配下へ専用の作業領域
//! `edit-crop-<key>/` を持ち、元画像のステージングと逐次の
//! リサイズ/切り抜き派生を保持する。派生ファイルは `close` まで
//! 残り、失敗時はその呼び出しで作られたものだけを片付ける。

use crate::error::{MediaLibraryError, Result};
use crate::path;
use crate::resizer::{ResizeMode, Resizer};
use crate::storage::{FileType, ItemType, LibraryStorage};
use std::fs;
use std::path::PathBuf;

/// 切り抜きの選択範囲
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// ステージ/リサイズ済み画像の参照
#[derive(Debug, Clone)]
pub struct CropImage {
    pub url: String,
    pub dimensions: (u32, u32),
}

/// ライブラリへ確定した切り抜きの記録
#[derive(Debug, Clone)]
pub struct CropResult {
    pub public_url: String,
    pub thumb_url: String,
    pub document_type: FileType,
    pub item_type: ItemType,
    pub path: String,
    pub title: String,
    pub folder: String,
}

/// 切り抜き結果を納めるサブフォルダ名
const CROPPED_FOLDER: &str = "cropped-images";

pub struct CropSessionManager {
    root: PathBuf,
    url_base: String,
}

impl CropSessionManager {
    pub fn new(root: impl Into<PathBuf>, url_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_base: url_base.into(),
        }
    }

    fn session_dir_name(key: &str) -> String {
        format!("edit-crop-{}", key)
    }

    fn session_dir(&self, key: &str) -> PathBuf {
        self.root.join(Self::session_dir_name(key))
    }

    fn session_url(&self, key: &str, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.url_base.trim_end_matches('/'),
            Self::session_dir_name(key),
            file_name
        )
    }

    /// 編集セッションを開始し、元画像をステージする
    ///
    /// 同じキーで再度呼ばれた場合、ステージ済みの元画像はそのまま
    /// 使われる（取得し直さない）。初回ステージが失敗したときは
    /// この呼び出しで作成したディレクトリのみ削除する。
    pub fn open(
        &self,
        storage: &dyn LibraryStorage,
        item_path: &str,
        key: &str,
    ) -> Result<CropImage> {
        path::validate_session_key(key)?;
        let item_path = path::validate(item_path, false)?;

        let dir = self.session_dir(key);
        let original_name = format!("original.{}", path::extension(&item_path));
        let original = dir.join(&original_name);

        if original.is_file() {
            let dimensions = image::image_dimensions(&original)?;
            return Ok(CropImage {
                url: self.session_url(key, &original_name),
                dimensions,
            });
        }

        let dir_created = !dir.is_dir();
        if dir_created {
            fs::create_dir_all(&dir)?;
        }

        let staged = (|| -> Result<(u32, u32)> {
            fs::write(&original, storage.get(&item_path)?)?;
            Ok(image::image_dimensions(&original)?)
        })();

        match staged {
            Ok(dimensions) => Ok(CropImage {
                url: self.session_url(key, &original_name),
                dimensions,
            }),
            Err(err) => {
                let _ = fs::remove_file(&original);
                if dir_created {
                    let _ = fs::remove_dir_all(&dir);
                }

                Err(err)
            }
        }
    }

    /// ステージ済みの元画像から指定寸法の派生を作る
    ///
    /// 元画像は上書きしない。派生は `resized-<幅>-<高さ>.<拡張子>` と
    /// して同じセッションディレクトリに置かれる。
    pub fn resize(&self, key: &str, width: u32, height: u32) -> Result<CropImage> {
        path::validate_session_key(key)?;

        if width == 0 || height == 0 {
            return Err(MediaLibraryError::InvalidInput(
                "リサイズ寸法は1以上を指定してください".to_string(),
            ));
        }

        let dir = self.session_dir(key);
        let original = self
            .find_original(key)?
            .ok_or_else(|| MediaLibraryError::SessionNotFound(key.to_string()))?;

        let ext = original
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        let resized_name = format!("resized-{}-{}.{}", width, height, ext);
        let resized = dir.join(&resized_name);

        let result = Resizer::open(&original)
            .and_then(|r| r.resize(width, height, ResizeMode::Exact).save(&resized));

        if let Err(err) = result {
            let _ = fs::remove_file(&resized);
            return Err(err);
        }

        let dimensions = image::image_dimensions(&resized)?;
        Ok(CropImage {
            url: self.session_url(key, &resized_name),
            dimensions,
        })
    }

    /// 指定の派生を選択範囲で切り抜き、ライブラリへ確定する
    ///
    /// 幅または高さが0の選択はコピーで代替する（明示的な縮退ケース）。
    /// 結果は元画像のフォルダ配下 `cropped-images/` に納められる。
    pub fn crop(
        &self,
        storage: &dyn LibraryStorage,
        key: &str,
        selection: &Selection,
        image_file_name: &str,
        item_path: &str,
    ) -> Result<CropResult> {
        path::validate_session_key(key)?;

        if image_file_name.is_empty()
            || image_file_name.contains("..")
            || image_file_name.contains('/')
            || image_file_name.contains('\\')
        {
            return Err(MediaLibraryError::InvalidInput(format!(
                "画像ファイル名が不正です: {}",
                image_file_name
            )));
        }

        let item_path = path::validate(item_path, false)?;

        let dir = self.session_dir(key);
        if !dir.is_dir() {
            return Err(MediaLibraryError::SessionNotFound(key.to_string()));
        }

        let source = dir.join(image_file_name);
        if !source.is_file() {
            return Err(MediaLibraryError::Storage(format!(
                "画像が見つかりません: {}",
                image_file_name
            )));
        }

        let original_name = path::base_name(&item_path);
        let ext = path::extension(&item_path);
        let base = original_name
            .strip_suffix(&format!(".{}", ext))
            .unwrap_or(original_name);

        let target_name = format!(
            "{}-{}-{}-{}-{}-{}.{}",
            base,
            selection.x,
            selection.y,
            selection.w,
            selection.h,
            chrono::Utc::now().timestamp(),
            ext
        );
        let target_tmp = dir.join(&target_name);

        // 幅か高さが0なら切り抜かずそのままコピーする
        let produced = if selection.w == 0 || selection.h == 0 {
            fs::copy(&source, &target_tmp).map(|_| ()).map_err(Into::into)
        } else {
            Resizer::open(&source).and_then(|r| {
                r.crop(
                    selection.x,
                    selection.y,
                    selection.w,
                    selection.h,
                    selection.w,
                    selection.h,
                )
                .save(&target_tmp)
            })
        };

        if let Err(err) = produced {
            let _ = fs::remove_file(&target_tmp);
            return Err(err);
        }

        let folder = path::join(&path::parent(&item_path), CROPPED_FOLDER);
        let target_path = path::join(&folder, &target_name);
        storage.put_file(&target_path, &target_tmp)?;

        Ok(CropResult {
            public_url: storage.url(&target_path),
            thumb_url: storage.url(&target_path),
            document_type: FileType::Image,
            item_type: ItemType::File,
            path: target_path,
            title: target_name,
            folder,
        })
    }

    /// セッションを終了し、作業領域を再帰的に削除する
    pub fn close(&self, key: &str) -> Result<()> {
        path::validate_session_key(key)?;

        let dir = self.session_dir(key);
        if dir.is_dir() {
            fs::remove_dir_all(&dir)?;
        }

        Ok(())
    }

    /// ステージ済み元画像を探す（拡張子は問わない）
    fn find_original(&self, key: &str) -> Result<Option<PathBuf>> {
        let dir = self.session_dir(key);
        if !dir.is_dir() {
            return Ok(None);
        }

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let file_path = entry.path();

            let is_original = file_path
                .file_stem()
                .map(|s| s.to_string_lossy() == "original")
                .unwrap_or(false);

            if is_original && file_path.is_file() {
                return Ok(Some(file_path));
            }
        }

        Ok(None)
    }
}

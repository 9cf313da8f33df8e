//! 閲覧状態と操作ファサード
//!
//! ビュー設定（フォルダ・フィルタ・ソート・検索・表示モード）は
//! セッション所有の明示的な状態オブジェクトとして持ち、設定は
//! すべて列挙集合に対する検証付きセッターを通す。
//! `MediaBrowser` はストレージアダプタへの一覧/検索の委譲と、
//! フォルダ・ファイル管理操作（イベント発火とキャッシュ破棄込み）
//! を担う。

use crate::error::{MediaLibraryError, Result};
use crate::events::{EventEmitter, EventListener, MediaEvent};
use crate::path;
use crate::resizer::ResizeMode;
use crate::storage::{FileType, ItemType, LibraryItem, LibraryStorage, SortBy, SortDirection, SortOptions};
use crate::thumbnail::ThumbnailParams;
use crate::upload;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// 一覧の表示モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
    Tiles,
}

impl ViewMode {
    /// 表示モードに応じたサムネイル既定パラメータ
    pub fn thumbnail_params(&self) -> ThumbnailParams {
        match self {
            ViewMode::List => ThumbnailParams::new(75, 75, ResizeMode::Crop),
            _ => ThumbnailParams::new(165, 165, ResizeMode::Crop),
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            "tiles" => Ok(ViewMode::Tiles),
            _ => Err(format!("Unknown view mode: {}", s)),
        }
    }
}

/// ファイル種別フィルタ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    Everything,
    Image,
    Audio,
    Document,
    Video,
}

impl Filter {
    /// アダプタへ渡すフィルタへ変換する（`everything` はフィルタなし）
    pub fn file_type(&self) -> Option<FileType> {
        match self {
            Filter::Everything => None,
            Filter::Image => Some(FileType::Image),
            Filter::Audio => Some(FileType::Audio),
            Filter::Document => Some(FileType::Document),
            Filter::Video => Some(FileType::Video),
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "everything" => Ok(Filter::Everything),
            "image" => Ok(Filter::Image),
            "audio" => Ok(Filter::Audio),
            "document" => Ok(Filter::Document),
            "video" => Ok(Filter::Video),
            _ => Err(format!("Unknown filter: {}", s)),
        }
    }
}

/// 切り抜き選択の動作モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    #[default]
    Normal,
    FixedRatio,
    FixedSize,
}

impl std::str::FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "normal" => Ok(SelectionMode::Normal),
            "fixed-ratio" => Ok(SelectionMode::FixedRatio),
            "fixed-size" => Ok(SelectionMode::FixedSize),
            _ => Err(format!("Unknown selection mode: {}", s)),
        }
    }
}

/// 切り抜き選択パラメータ
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SelectionParams {
    pub mode: SelectionMode,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// セッション所有の閲覧状態
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowsingState {
    version: u32,
    pub folder: String,
    pub filter: Filter,
    pub sort_by: SortBy,
    pub sort_direction: SortDirection,
    pub search_term: String,
    pub view_mode: ViewMode,
    pub selection: SelectionParams,
    pub sidebar_visible: bool,
}

impl Default for BrowsingState {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            folder: path::FOLDER_ROOT.to_string(),
            filter: Filter::default(),
            sort_by: SortBy::default(),
            sort_direction: SortDirection::default(),
            search_term: String::new(),
            view_mode: ViewMode::default(),
            selection: SelectionParams::default(),
            sidebar_visible: true,
        }
    }
}

impl BrowsingState {
    const CURRENT_VERSION: u32 = 1;

    fn state_file(dir: &Path, key: &str) -> std::path::PathBuf {
        dir.join(format!("browse-state-{}.json", key))
    }

    /// 保存済み状態を読み込む（欠損・破損・版不一致は既定値）
    pub fn load(dir: &Path, key: &str) -> Self {
        let state_path = Self::state_file(dir, key);
        if !state_path.exists() {
            return Self::default();
        }

        let file = match fs::File::open(&state_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, BrowsingState>(reader) {
            Ok(state) if state.version == Self::CURRENT_VERSION => state,
            _ => Self::default(),
        }
    }

    /// 状態を保存する
    pub fn save(&self, dir: &Path, key: &str) -> Result<()> {
        path::validate_session_key(key)?;
        fs::create_dir_all(dir)?;

        let file = fs::File::create(Self::state_file(dir, key))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn set_folder(&mut self, folder: &str) -> Result<()> {
        self.folder = path::validate(folder, true)?;
        Ok(())
    }

    pub fn set_filter(&mut self, value: &str) -> Result<()> {
        self.filter = value
            .parse()
            .map_err(MediaLibraryError::InvalidInput)?;
        Ok(())
    }

    pub fn set_sort_by(&mut self, value: &str) -> Result<()> {
        self.sort_by = value
            .parse()
            .map_err(MediaLibraryError::InvalidInput)?;
        Ok(())
    }

    pub fn set_sort_direction(&mut self, value: &str) -> Result<()> {
        self.sort_direction = value
            .parse()
            .map_err(MediaLibraryError::InvalidInput)?;
        Ok(())
    }

    pub fn set_view_mode(&mut self, value: &str) -> Result<()> {
        self.view_mode = value
            .parse()
            .map_err(MediaLibraryError::InvalidInput)?;
        Ok(())
    }

    pub fn set_search_term(&mut self, term: Option<&str>) {
        self.search_term = term.map(|t| t.trim().to_string()).unwrap_or_default();
    }

    pub fn set_selection_params(
        &mut self,
        mode: &str,
        width: Option<&str>,
        height: Option<&str>,
    ) -> Result<()> {
        let mode: SelectionMode = mode
            .parse()
            .map_err(MediaLibraryError::InvalidInput)?;

        self.selection = SelectionParams {
            mode,
            width: parse_dimension(width)?,
            height: parse_dimension(height)?,
        };
        Ok(())
    }

    pub fn set_sidebar_visible(&mut self, visible: bool) {
        self.sidebar_visible = visible;
    }

    pub fn sort_options(&self) -> SortOptions {
        SortOptions::new(self.sort_by, self.sort_direction)
    }

    /// 検索モードかどうか（検索語が空でない）
    pub fn searching(&self) -> bool {
        !self.search_term.is_empty()
    }
}

/// 数字のみの寸法文字列を解釈する（空・未指定はなし）
fn parse_dimension(value: Option<&str>) -> Result<Option<u32>> {
    match value {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => {
            if !s.chars().all(|c| c.is_ascii_digit()) {
                return Err(MediaLibraryError::InvalidInput(format!(
                    "寸法が数値ではありません: {}",
                    s
                )));
            }

            s.parse::<u32>().map(Some).map_err(|_| {
                MediaLibraryError::InvalidInput(format!("寸法が大きすぎます: {}", s))
            })
        }
    }
}

/// アップロード確定の結果
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub path: String,
    pub link: String,
}

/// ライブラリ操作ファサード
pub struct MediaBrowser {
    storage: Box<dyn LibraryStorage>,
    events: EventEmitter,
}

impl MediaBrowser {
    pub fn new(storage: Box<dyn LibraryStorage>) -> Self {
        Self {
            storage,
            events: EventEmitter::new(),
        }
    }

    pub fn storage(&self) -> &dyn LibraryStorage {
        self.storage.as_ref()
    }

    pub fn subscribe(&mut self, listener: EventListener) {
        self.events.subscribe(listener);
    }

    /// 現在の閲覧状態に応じた項目一覧
    ///
    /// 検索語があれば全体検索、なければフォルダ一覧。フィルタの
    /// `everything` はアダプタへ渡す前に「フィルタなし」へ変換する。
    pub fn list_items(&self, state: &BrowsingState) -> Result<Vec<LibraryItem>> {
        let filter = state.filter.file_type();
        let sort = state.sort_options();

        if state.searching() {
            self.storage.find(&state.search_term, &sort, filter)
        } else {
            self.storage.list(&state.folder, &sort, filter)
        }
    }

    /// パンくず用にフォルダパスを累積セグメントへ分解する
    pub fn path_segments(&self, folder: &str) -> Result<Vec<(String, String)>> {
        let folder = path::validate(folder, true)?;
        if folder == path::FOLDER_ROOT {
            return Ok(Vec::new());
        }

        let mut segments = Vec::new();
        let mut accumulated = String::new();

        for segment in folder.trim_start_matches('/').split('/') {
            accumulated.push('/');
            accumulated.push_str(segment);
            segments.push((segment.to_string(), accumulated.clone()));
        }

        Ok(segments)
    }

    /// フォルダを作成する
    pub fn create_folder(&self, parent: &str, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MediaLibraryError::InvalidInput(
                "名前を入力してください".to_string(),
            ));
        }

        if !path::validate_file_name(name) {
            return Err(MediaLibraryError::InvalidInput(format!(
                "名前が不正です: {}",
                name
            )));
        }

        let parent = path::validate(parent, true)?;
        let new_path = path::join(&parent, name);

        if self.storage.folder_exists(&new_path)? || self.storage.has(&new_path)? {
            return Err(MediaLibraryError::InvalidInput(format!(
                "同名のフォルダまたはファイルが存在します: {}",
                new_path
            )));
        }

        self.storage.make_folder(&new_path)?;
        self.events.emit(&MediaEvent::FolderCreate { path: &new_path });
        self.storage.reset_cache();

        Ok(new_path)
    }

    /// 項目の名前を変更する（同一フォルダ内の移動）
    pub fn rename(&self, item_path: &str, new_name: &str, item_type: ItemType) -> Result<String> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(MediaLibraryError::InvalidInput(
                "名前を入力してください".to_string(),
            ));
        }

        if !path::validate_file_name(new_name) {
            return Err(MediaLibraryError::InvalidInput(format!(
                "名前が不正です: {}",
                new_name
            )));
        }

        let item_path = path::validate(item_path, false)?;
        let new_path = path::join(&path::parent(&item_path), new_name);

        match item_type {
            ItemType::File => {
                if !upload::validate_file_type(new_name) {
                    return Err(MediaLibraryError::InvalidInput(format!(
                        "この種類のファイルは受け付けられません: {}",
                        new_name
                    )));
                }

                self.storage.move_file(&item_path, &new_path)?;
                self.events.emit(&MediaEvent::FileRename {
                    from: &item_path,
                    to: &new_path,
                });
            }
            ItemType::Folder => {
                self.storage.move_folder(&item_path, &new_path)?;
                self.events.emit(&MediaEvent::FolderRename {
                    from: &item_path,
                    to: &new_path,
                });
            }
        }

        self.storage.reset_cache();
        Ok(new_path)
    }

    /// 複数の項目を移動する
    pub fn move_items(&self, dest: &str, files: &[String], folders: &[String]) -> Result<()> {
        let dest = path::validate(dest, true)?;

        for file in files {
            let src = path::validate(file, false)?;
            let target = path::join(&dest, path::base_name(&src));

            if target == src {
                return Err(MediaLibraryError::InvalidInput(
                    "移動元と移動先が同じです".to_string(),
                ));
            }

            self.storage.move_file(&src, &target)?;
            self.events.emit(&MediaEvent::FileMove {
                path: &src,
                dest: &dest,
            });
        }

        for folder in folders {
            let src = path::validate(folder, false)?;
            let target = path::join(&dest, path::base_name(&src));

            if target == src {
                return Err(MediaLibraryError::InvalidInput(
                    "移動元と移動先が同じです".to_string(),
                ));
            }

            self.storage.move_folder(&src, &target)?;
            self.events.emit(&MediaEvent::FolderMove {
                path: &src,
                dest: &dest,
            });
        }

        self.storage.reset_cache();
        Ok(())
    }

    /// 項目を削除する（ファイルは一括、フォルダは個別）
    pub fn delete_items(&self, items: &[(String, ItemType)]) -> Result<()> {
        let mut files_to_delete = Vec::new();

        for (item_path, item_type) in items {
            let item_path = path::validate(item_path, false)?;

            match item_type {
                ItemType::File => files_to_delete.push(item_path),
                ItemType::Folder => {
                    self.storage.delete_folder(&item_path)?;
                    self.events.emit(&MediaEvent::FolderDelete { path: &item_path });
                }
            }
        }

        if !files_to_delete.is_empty() {
            self.storage.delete_files(&files_to_delete)?;

            for item_path in &files_to_delete {
                self.events.emit(&MediaEvent::FileDelete { path: item_path });
            }
        }

        self.storage.reset_cache();
        Ok(())
    }

    /// ファイルをライブラリへ取り込む
    ///
    /// 拡張子は小文字へ統一し、不正な名前（または `auto_rename_slug`
    /// 指定時は常に）はスラグ化する。受け入れ対象外の拡張子と、
    /// 上書き不許可時の既存パスは拒否する。
    pub fn upload(
        &self,
        folder: &str,
        file_name: &str,
        data: &[u8],
        auto_rename_slug: bool,
        allow_overwrite: bool,
    ) -> Result<UploadResult> {
        let folder = path::validate(folder, true)?;

        let ext = path::extension(file_name);
        if ext.is_empty() {
            return Err(MediaLibraryError::InvalidInput(format!(
                "拡張子がありません: {}",
                file_name
            )));
        }

        let stem = match file_name.rfind('.') {
            Some(pos) => &file_name[..pos],
            None => file_name,
        };
        let mut name = format!("{}.{}", stem, ext);

        if auto_rename_slug || !path::validate_file_name(&name) {
            let slug = upload::slug_file_name(stem);
            name = format!("{}.{}", slug, ext);
        }

        if !path::validate_file_name(&name) {
            return Err(MediaLibraryError::InvalidInput(format!(
                "ファイル名が不正です: {}",
                file_name
            )));
        }

        if !upload::validate_file_type(&name) {
            return Err(MediaLibraryError::InvalidInput(format!(
                "この種類のファイルは受け付けられません: {}",
                name
            )));
        }

        let file_path = path::join(&folder, &name);

        if !allow_overwrite && self.storage.has(&file_path)? {
            return Err(MediaLibraryError::InvalidInput(format!(
                "同じ場所にファイルが既に存在します: {}",
                file_path
            )));
        }

        self.storage.put(&file_path, data)?;

        // リスナーは確定パスを差し替えられる（最初の結果を採用）
        let final_path = self
            .events
            .emit(&MediaEvent::FileUpload { path: &file_path })
            .unwrap_or(file_path);

        self.storage.reset_cache();

        Ok(UploadResult {
            link: self.storage.url(&final_path),
            path: final_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_accept_known_values() {
        let mut state = BrowsingState::default();

        state.set_view_mode("list").unwrap();
        state.set_filter("image").unwrap();
        state.set_sort_by("size").unwrap();
        state.set_sort_direction("desc").unwrap();
        state.set_folder("/photos").unwrap();

        assert_eq!(state.view_mode, ViewMode::List);
        assert_eq!(state.filter, Filter::Image);
        assert_eq!(state.sort_by, SortBy::Size);
        assert_eq!(state.sort_direction, SortDirection::Desc);
        assert_eq!(state.folder, "/photos");
    }

    #[test]
    fn test_setters_reject_unknown_values() {
        let mut state = BrowsingState::default();

        assert!(state.set_view_mode("mosaic").is_err());
        assert!(state.set_filter("archives").is_err());
        assert!(state.set_sort_by("color").is_err());
        assert!(state.set_sort_direction("sideways").is_err());
        assert!(state.set_folder("../etc").is_err());
    }

    #[test]
    fn test_selection_params_validation() {
        let mut state = BrowsingState::default();

        state
            .set_selection_params("fixed-ratio", Some("4"), Some("3"))
            .unwrap();
        assert_eq!(state.selection.mode, SelectionMode::FixedRatio);
        assert_eq!(state.selection.width, Some(4));
        assert_eq!(state.selection.height, Some(3));

        state.set_selection_params("normal", Some(""), None).unwrap();
        assert_eq!(state.selection.width, None);
        assert_eq!(state.selection.height, None);

        assert!(state.set_selection_params("freeform", None, None).is_err());
        assert!(state
            .set_selection_params("normal", Some("12a"), None)
            .is_err());
        assert!(state
            .set_selection_params("normal", Some("-3"), None)
            .is_err());
    }

    #[test]
    fn test_search_term_trimmed() {
        let mut state = BrowsingState::default();

        state.set_search_term(Some("  holiday "));
        assert_eq!(state.search_term, "holiday");
        assert!(state.searching());

        state.set_search_term(None);
        assert!(!state.searching());
    }

    #[test]
    fn test_filter_everything_maps_to_none() {
        assert_eq!(Filter::Everything.file_type(), None);
        assert_eq!(Filter::Image.file_type(), Some(FileType::Image));
    }

    #[test]
    fn test_view_mode_thumbnail_params() {
        let grid = ViewMode::Grid.thumbnail_params();
        assert_eq!((grid.width, grid.height), (165, 165));

        let list = ViewMode::List.thumbnail_params();
        assert_eq!((list.width, list.height), (75, 75));
    }
}

use crate::resizer::ResizeMode;
use crate::storage::{SortBy, SortDirection};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "media-library")]
#[command(about = "メディアライブラリ閲覧・サムネイル生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ライブラリルートを上書き
    #[arg(long, global = true)]
    pub library_root: Option<PathBuf>,

    /// サムネイルルートを上書き
    #[arg(long, global = true)]
    pub thumb_root: Option<PathBuf>,

    /// 閲覧状態のセッションキー
    #[arg(long, default_value = "default", global = true)]
    pub session: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// フォルダ内容を一覧表示
    Ls {
        /// 対象フォルダ（省略時は保存された現在フォルダ）
        folder: Option<String>,

        /// ファイル名で検索
        #[arg(short, long)]
        search: Option<String>,

        /// 種別フィルタ (everything/image/audio/document/video)
        #[arg(short, long)]
        filter: Option<String>,

        /// ソート列 (title/size/modified)
        #[arg(long)]
        sort_by: Option<String>,

        /// ソート方向 (asc/desc)
        #[arg(long)]
        direction: Option<String>,
    },

    /// サムネイルを生成（キャッシュ済みならスキップ）
    Thumb {
        /// 対象ファイルのライブラリパス
        #[arg(required = true)]
        paths: Vec<String>,

        /// 幅
        #[arg(long, default_value = "165")]
        width: u32,

        /// 高さ
        #[arg(long, default_value = "165")]
        height: u32,

        /// リサイズモード (auto/crop/exact)
        #[arg(short, long, default_value = "crop")]
        mode: ResizeMode,
    },

    /// ファイルをライブラリへアップロード
    Upload {
        /// 取り込むローカルファイル
        #[arg(required = true)]
        file: PathBuf,

        /// 取り込み先フォルダ
        #[arg(short, long, default_value = "/uploaded-files")]
        folder: String,

        /// 既存ファイルの上書きを許可
        #[arg(long)]
        overwrite: bool,
    },

    /// フォルダを作成
    Mkdir {
        /// 作成するフォルダのパス
        #[arg(required = true)]
        path: String,
    },

    /// ファイル/フォルダを削除
    Rm {
        /// 削除対象のパス
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// ファイル/フォルダを移動
    Mv {
        /// 移動元のパス
        #[arg(required = true)]
        src: String,

        /// 移動先フォルダ
        #[arg(required = true)]
        dest: String,
    },

    /// 画像編集セッションを開始して元画像をステージ
    CropOpen {
        /// 対象画像のライブラリパス
        #[arg(required = true)]
        path: String,
    },

    /// セッション中の元画像から派生をリサイズ
    CropResize {
        /// 幅
        #[arg(required = true)]
        width: u32,

        /// 高さ
        #[arg(required = true)]
        height: u32,
    },

    /// 選択範囲で切り抜いてライブラリへ確定
    CropApply {
        /// 対象の派生ファイル名（セッション内）
        #[arg(required = true)]
        image: String,

        /// 元画像のライブラリパス
        #[arg(required = true)]
        path: String,

        /// 選択範囲 左上X
        #[arg(required = true)]
        x: u32,

        /// 選択範囲 左上Y
        #[arg(required = true)]
        y: u32,

        /// 選択範囲 幅
        #[arg(required = true)]
        w: u32,

        /// 選択範囲 高さ
        #[arg(required = true)]
        h: u32,
    },

    /// 編集セッションを終了して作業領域を削除
    CropClose,

    /// 設定を表示/編集
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// ライブラリルートを設定
        #[arg(long)]
        set_library_root: Option<PathBuf>,

        /// サムネイルルートを設定
        #[arg(long)]
        set_thumb_root: Option<PathBuf>,
    },
}

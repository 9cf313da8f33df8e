//! メディア操作の通知フック
//!
//! リスナーを登録順に呼び、最初に `Some` を返したものの値で打ち切る。
//! `None` を返すリスナーは純粋な観測者として扱われる。

/// ライブラリ操作の後に発火するイベント
#[derive(Debug, Clone, Copy)]
pub enum MediaEvent<'a> {
    FileUpload { path: &'a str },
    FileDelete { path: &'a str },
    FolderDelete { path: &'a str },
    FileRename { from: &'a str, to: &'a str },
    FolderRename { from: &'a str, to: &'a str },
    FileMove { path: &'a str, dest: &'a str },
    FolderMove { path: &'a str, dest: &'a str },
    FolderCreate { path: &'a str },
}

pub type EventListener = Box<dyn Fn(&MediaEvent<'_>) -> Option<String>>;

#[derive(Default)]
pub struct EventEmitter {
    listeners: Vec<EventListener>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    /// 登録順に発火し、最初の非 `None` 結果で打ち切って返す
    pub fn emit(&self, event: &MediaEvent<'_>) -> Option<String> {
        for listener in &self.listeners {
            if let Some(result) = listener(event) {
                return Some(result);
            }
        }

        None
    }
}

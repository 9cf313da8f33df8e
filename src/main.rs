use anyhow::{anyhow, Result};
use clap::Parser;
use indicatif::ProgressBar;
use media_library_rust::{browse, cli, config, crop, path, storage, thumbnail};

use browse::{BrowsingState, MediaBrowser};
use cli::{Cli, Commands};
use config::Config;
use crop::{CropSessionManager, Selection};
use storage::{ItemType, LibraryItem, LibraryStorage, LocalStorage, SortOptions};
use thumbnail::{ThumbnailCache, ThumbnailParams};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    if let Some(root) = &cli.library_root {
        config.library_root = root.clone();
    }
    if let Some(root) = &cli.thumb_root {
        config.thumb_root = root.clone();
        config.state_dir = root.join("state");
    }

    // 設定コマンドはストレージを開かずに処理する
    if let Commands::Config { show, set_library_root, set_thumb_root } = &cli.command {
        let mut changed = false;

        if let Some(root) = set_library_root {
            config.library_root = root.clone();
            changed = true;
        }
        if let Some(root) = set_thumb_root {
            config.thumb_root = root.clone();
            config.state_dir = root.join("state");
            changed = true;
        }

        if changed {
            config.save()?;
            println!("✔ 設定を保存: {}", Config::config_path()?.display());
        }

        if *show || !changed {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        return Ok(());
    }

    let local = LocalStorage::open(&config.library_root, &config.media_url_base)?;
    let browser = MediaBrowser::new(Box::new(local));
    let thumbnails = ThumbnailCache::open(&config.thumb_root, &config.thumb_url_base)?;
    let sessions = CropSessionManager::new(&config.thumb_root, &config.thumb_url_base);
    let mut state = BrowsingState::load(&config.state_dir, &cli.session);

    match cli.command {
        Commands::Ls { folder, search, filter, sort_by, direction } => {
            if let Some(folder) = folder {
                state.set_folder(&folder)?;
            }
            if let Some(filter) = filter {
                state.set_filter(&filter)?;
            }
            if let Some(sort_by) = sort_by {
                state.set_sort_by(&sort_by)?;
            }
            if let Some(direction) = direction {
                state.set_sort_direction(&direction)?;
            }
            state.set_search_term(search.as_deref());

            let items = browser.list_items(&state)?;

            if state.searching() {
                println!("🔍 検索: {}\n", state.search_term);
            } else {
                println!("📁 {}\n", state.folder);
            }

            for item in &items {
                match item.item_type {
                    ItemType::Folder => println!("  📁 {}/", item.title()),
                    ItemType::File => println!(
                        "  📄 {} ({} bytes, {})",
                        item.title(),
                        item.size,
                        item.file_type.as_str()
                    ),
                }
            }

            println!("\n✔ {}件", items.len());
            state.save(&config.state_dir, &cli.session)?;
        }

        Commands::Thumb { paths, width, height, mode } => {
            println!("🖼  サムネイル生成\n");

            let params = ThumbnailParams::new(width, height, mode);
            let progress = if paths.len() > 1 {
                Some(ProgressBar::new(paths.len() as u64))
            } else {
                None
            };

            let mut ready = 0usize;
            let mut broken = 0usize;

            for item_path in &paths {
                let item = find_item(browser.storage(), item_path)?;
                let thumb =
                    thumbnails.ensure(browser.storage(), item_path, item.last_modified, &params)?;

                if thumb.broken {
                    broken += 1;
                } else {
                    ready += 1;
                }

                if let Some(progress) = &progress {
                    progress.inc(1);
                } else {
                    println!("✔ {}", thumb.url);
                }
            }

            if let Some(progress) = progress {
                progress.finish_and_clear();
            }

            if broken > 0 {
                println!("\n✅ 完了: {}件（エラー {}件）", ready, broken);
            } else {
                println!("\n✅ 完了: {}件", ready);
            }
        }

        Commands::Upload { file, folder, overwrite } => {
            println!("📤 アップロード\n");

            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| anyhow!("ファイル名を取得できません: {}", file.display()))?;
            let data = std::fs::read(&file)?;

            let result = browser.upload(
                &folder,
                &file_name,
                &data,
                config.auto_rename_slug,
                overwrite,
            )?;

            println!("✅ 取り込み完了: {}", result.path);
            println!("   {}", result.link);
        }

        Commands::Mkdir { path } => {
            let parent = path::parent(&path);
            let name = path::base_name(&path).to_string();
            let created = browser.create_folder(&parent, &name)?;
            println!("✅ フォルダを作成: {}", created);
        }

        Commands::Rm { paths } => {
            let mut items = Vec::new();
            for item_path in &paths {
                let normalized = path::validate(item_path, false)?;
                let item_type = if browser.storage().folder_exists(&normalized)? {
                    ItemType::Folder
                } else {
                    ItemType::File
                };
                items.push((normalized, item_type));
            }

            browser.delete_items(&items)?;
            println!("✅ {}件を削除", items.len());
        }

        Commands::Mv { src, dest } => {
            let normalized = path::validate(&src, false)?;
            let (files, folders) = if browser.storage().folder_exists(&normalized)? {
                (Vec::new(), vec![normalized])
            } else {
                (vec![normalized], Vec::new())
            };

            browser.move_items(&dest, &files, &folders)?;
            println!("✅ 移動完了: {} -> {}", src, dest);
        }

        Commands::CropOpen { path } => {
            let image = sessions.open(browser.storage(), &path, &cli.session)?;
            println!("✂️  編集セッション開始: {}", cli.session);
            println!("   {} ({}x{})", image.url, image.dimensions.0, image.dimensions.1);
        }

        Commands::CropResize { width, height } => {
            let image = sessions.resize(&cli.session, width, height)?;
            println!("✔ リサイズ: {} ({}x{})", image.url, image.dimensions.0, image.dimensions.1);
        }

        Commands::CropApply { image, path, x, y, w, h } => {
            let selection = Selection { x, y, w, h };
            let result = sessions.crop(browser.storage(), &cli.session, &selection, &image, &path)?;

            println!("✅ 切り抜きを保存: {}", result.path);
            println!("   {}", result.public_url);
        }

        Commands::CropClose => {
            sessions.close(&cli.session)?;
            println!("✅ 編集セッションを終了: {}", cli.session);
        }

        Commands::Config { .. } => unreachable!(),
    }

    Ok(())
}

/// ライブラリパスから項目情報を引く（親フォルダの一覧から）
fn find_item(storage: &dyn LibraryStorage, item_path: &str) -> Result<LibraryItem> {
    let normalized = path::validate(item_path, false)?;
    let parent = path::parent(&normalized);
    let items = storage.list(&parent, &SortOptions::default(), None)?;

    items
        .into_iter()
        .find(|i| i.path == normalized)
        .ok_or_else(|| anyhow!("ファイルが見つかりません: {}", item_path))
}

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{FolderEntry, PlatformConfig};
use crate::model::{Folder, Game, Item};

const IGNORED_EXTS: [&str; 5] = ["zip", "7z", "rar", "gz", "xz"];

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn wanted(p: &Path, extensions: &[String]) -> bool {
    let Some(ext) = p.extension().and_then(|s| s.to_str()) else {
        return extensions.is_empty();
    };
    let ext = ext.to_lowercase();
    if IGNORED_EXTS.contains(&ext.as_str()) {
        return false;
    }
    extensions.is_empty() || extensions.iter().any(|e| e.to_lowercase() == ext)
}

/// All games under one platform's root, sorted by path.
pub fn scan_platform(platform: &PlatformConfig) -> Vec<Game> {
    let root = expand_home(&platform.root);
    if !root.is_dir() {
        warn!("Platform {} root {} is not a directory", platform.name, root.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = Vec::new();
    let mut stack: Vec<PathBuf> = vec![root];
    while let Some(cur) = stack.pop() {
        if let Ok(entries) = cur.read_dir() {
            for e in entries.flatten() {
                let p = e.path();
                match e.file_type() {
                    Ok(ft) if ft.is_dir() => stack.push(p),
                    Ok(ft) if ft.is_file() && wanted(&p, &platform.extensions) => files.push(p),
                    _ => {}
                }
            }
        }
    }
    files.sort();

    debug!("{}: {} games", platform.name, files.len());
    files
        .into_iter()
        .map(|p| Game {
            title: p
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: p.to_string_lossy().into_owned(),
            emulator: platform.emulator.clone(),
        })
        .collect()
}

/// Games of every platform, in platform order.
pub fn scan_all(platforms: &[PlatformConfig]) -> Vec<Game> {
    platforms.iter().flat_map(scan_platform).collect()
}

/// Build the root collection: configured folders first, holding the games
/// they list, then every remaining game.
pub fn arrange(games: Vec<Game>, folders: &[FolderEntry]) -> Vec<Item> {
    let mut loose: Vec<Option<Game>> = games.into_iter().map(Some).collect();
    let mut root: Vec<Item> = folders
        .iter()
        .map(|entry| Item::Folder(build_folder(entry, &mut loose)))
        .collect();
    root.extend(loose.into_iter().flatten().map(Item::Game));
    root
}

fn build_folder(entry: &FolderEntry, loose: &mut [Option<Game>]) -> Folder {
    let mut folder = Folder::new(entry.name.clone());
    for sub in &entry.folders {
        folder.children.push(Item::Folder(build_folder(sub, loose)));
    }
    for listed in &entry.games {
        let listed = expand_home(listed);
        let slot = loose
            .iter_mut()
            .find(|g| matches!(g, Some(game) if Path::new(&game.path) == listed));
        match slot.and_then(Option::take) {
            Some(game) => folder.children.push(Item::Game(game)),
            None => debug!("folder {} lists unknown game {}", entry.name, listed.display()),
        }
    }
    folder
}

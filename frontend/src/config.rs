use evdev::KeyCode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::input::{Calibration, BUTTON_ACTIVATE, BUTTON_BACK, BUTTON_SETTINGS};

/// Kernel key codes for the remote's A, B and Home buttons.
const BTN_A: u16 = KeyCode::BTN_SOUTH.code();
const BTN_B: u16 = KeyCode::BTN_EAST.code();
const BTN_MODE: u16 = KeyCode::BTN_MODE.code();

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlatformConfig {
    pub name: String,
    pub root: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Emulator command line; `{rom}` is replaced by the game path.
    pub emulator: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct LayoutConfig {
    pub columns: Option<usize>,
    pub rows: Option<usize>,
    pub theme_color: Option<[u8; 3]>,
    pub icon_size: Option<f32>,
    pub padding: Option<f32>,
    pub label_padding: Option<f32>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonBinding {
    pub code: u16,
    pub button: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Substrings matched against input device names.
    pub names: Vec<String>,
    pub center: i32,
    pub divisor: i32,
    pub buttons: Vec<ButtonBinding>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            names: vec!["Wiimote".to_string(), "Nintendo".to_string()],
            center: 128,
            divisor: 10,
            buttons: vec![
                ButtonBinding { code: BTN_A, button: BUTTON_ACTIVATE },
                ButtonBinding { code: BTN_B, button: BUTTON_BACK },
                ButtonBinding { code: BTN_MODE, button: BUTTON_SETTINGS },
            ],
        }
    }
}

impl DeviceConfig {
    pub fn calibration(&self) -> Calibration {
        Calibration {
            center: self.center,
            divisor: self.divisor,
        }
    }

    pub fn button_for(&self, code: u16) -> Option<u32> {
        self.buttons.iter().find(|b| b.code == code).map(|b| b.button)
    }
}

/// A folder in the menu tree, with the game paths it holds.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct FolderEntry {
    pub name: String,
    #[serde(default)]
    pub games: Vec<String>,
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct ConfigFile {
    pub font_path: Option<String>,
    pub layout: Option<LayoutConfig>,
    pub device: Option<DeviceConfig>,
    pub platforms: Option<Vec<PlatformConfig>>,
    pub folders: Option<Vec<FolderEntry>>,
}

impl ConfigFile {
    pub fn columns(&self) -> usize {
        self.layout.as_ref().and_then(|l| l.columns).unwrap_or(4).max(1)
    }

    pub fn rows(&self) -> usize {
        self.layout.as_ref().and_then(|l| l.rows).unwrap_or(3).max(1)
    }

    pub fn theme_color(&self) -> [u8; 3] {
        self.layout
            .as_ref()
            .and_then(|l| l.theme_color)
            .unwrap_or([0x1a, 0x23, 0x7e])
    }

    pub fn device(&self) -> DeviceConfig {
        self.device.clone().unwrap_or_default()
    }

    /// Record a folder created inside the folder reached by `slots` (root when
    /// empty); each slot is a position among sibling folders. Returns false when
    /// a slot has no entry.
    pub fn record_folder(&mut self, slots: &[usize], name: &str) -> bool {
        let mut level = self.folders.get_or_insert_with(Vec::new);
        for &slot in slots {
            match level.get_mut(slot) {
                Some(entry) => level = &mut entry.folders,
                None => return false,
            }
        }
        level.push(FolderEntry {
            name: name.to_string(),
            ..Default::default()
        });
        true
    }

    /// Overlay the fields present in `parsed`.
    fn merge(&mut self, parsed: ConfigFile) {
        if parsed.platforms.is_some() {
            self.platforms = parsed.platforms;
        }
        if parsed.layout.is_some() {
            self.layout = parsed.layout;
        }
        if parsed.device.is_some() {
            self.device = parsed.device;
        }
        if parsed.folders.is_some() {
            self.folders = parsed.folders;
        }
        if parsed.font_path.is_some() {
            self.font_path = parsed.font_path;
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let mut p = PathBuf::from(xdg);
        p.push("rpi_launcher_menu");
        p.push("config.toml");
        Some(p)
    } else if let Some(home) = dirs::home_dir() {
        let mut p = home;
        p.push(".config/rpi_launcher_menu/config.toml");
        Some(p)
    } else {
        None
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError + '_ {
    move |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, contents.as_bytes()).map_err(io_err(&tmp))?;
    std::fs::rename(&tmp, path).map_err(io_err(path))?;
    Ok(())
}

fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    write_atomic(path, include_str!("../config.sample.toml"))
}

fn default_config() -> ConfigFile {
    ConfigFile {
        layout: Some(LayoutConfig {
            columns: Some(4),
            rows: Some(3),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Load the config at `path`, writing the sample first if it does not exist.
/// Parse errors fall back to defaults so the menu still comes up.
pub fn load_config_from(path: &Path) -> ConfigFile {
    let mut cfg = default_config();
    if !path.exists() {
        match write_default_config(path) {
            Ok(()) => info!("Wrote default config to {}", path.display()),
            Err(e) => warn!("Failed to write default config: {}", e),
        }
    }
    match read_config(path) {
        Ok(parsed) => cfg.merge(parsed),
        Err(e) => warn!("{}", e),
    }
    cfg
}

pub fn load_config() -> ConfigFile {
    match user_config_path() {
        Some(p) => load_config_from(&p),
        None => {
            warn!("{}", ConfigError::NoPath);
            default_config()
        }
    }
}

pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(io_err(path))?;
    toml::from_str::<ConfigFile>(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_config_to(path: &Path, cfg: &ConfigFile) -> Result<(), ConfigError> {
    let s = toml::to_string_pretty(cfg)?;
    write_atomic(path, &s)
}

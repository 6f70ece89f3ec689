use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::surface::{
    LayoutOptions, MAX_LINE_SPACING, MAX_MARGIN, MAX_PARAGRAPH_SPACING, MIN_LINE_SPACING,
    MIN_PARAGRAPH_SPACING,
};
use crate::theme::ThemeId;

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = "config.yaml";
const BOOKMARKS_FILENAME: &str = "bookmarks.json";
const APP_NAME: &str = "folio";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default = "default_margin")]
    pub margin: u16,

    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,

    #[serde(default = "default_paragraph_spacing")]
    pub paragraph_spacing: f32,

    #[serde(default = "default_true")]
    pub show_images: bool,

    #[serde(default)]
    pub reading_mode: bool,

    #[serde(default = "default_true")]
    pub toc_visible: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_theme() -> String {
    ThemeId::default().key().to_string()
}

fn default_margin() -> u16 {
    LayoutOptions::default().margin
}

fn default_line_spacing() -> f32 {
    LayoutOptions::default().line_spacing
}

fn default_paragraph_spacing() -> f32 {
    LayoutOptions::default().paragraph_spacing
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            theme: default_theme(),
            margin: default_margin(),
            line_spacing: default_line_spacing(),
            paragraph_spacing: default_paragraph_spacing(),
            show_images: true,
            reading_mode: false,
            toc_visible: true,
            last_opened: None,
        }
    }
}

impl Settings {
    pub fn theme_id(&self) -> ThemeId {
        ThemeId::from_key(&self.theme)
    }

    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            margin: self.margin,
            line_spacing: self.line_spacing,
            paragraph_spacing: self.paragraph_spacing,
        }
    }

    pub fn set_layout_options(&mut self, options: LayoutOptions) {
        let options = options.clamped();
        self.margin = options.margin;
        self.line_spacing = options.line_spacing;
        self.paragraph_spacing = options.paragraph_spacing;
    }

    /// Pulls hand-edited values back into range. Returns `true` if
    /// anything changed.
    fn clamp(&mut self) -> bool {
        let before = self.clone();
        self.margin = self.margin.min(MAX_MARGIN);
        self.line_spacing = clamp_or(
            self.line_spacing,
            MIN_LINE_SPACING,
            MAX_LINE_SPACING,
            default_line_spacing(),
        );
        self.paragraph_spacing = clamp_or(
            self.paragraph_spacing,
            MIN_PARAGRAPH_SPACING,
            MAX_PARAGRAPH_SPACING,
            default_paragraph_spacing(),
        );
        if ThemeId::from_key(&self.theme).key() != self.theme {
            warn!("Unknown theme {:?}, using default", self.theme);
            self.theme = default_theme();
        }
        *self != before
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Files from the first release named the theme by display name and kept
/// no spacing fields.
fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    if settings.version < 2 {
        if let Some(theme) = ThemeId::all()
            .iter()
            .find(|t| t.name().eq_ignore_ascii_case(&settings.theme))
        {
            settings.theme = theme.key().to_string();
        }
    }

    settings.version = CURRENT_VERSION;
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME))
}

pub fn default_settings_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(SETTINGS_FILENAME))
}

pub fn default_bookmarks_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(BOOKMARKS_FILENAME))
}

/// Owns the settings and the file they persist to. An ephemeral store
/// never reads or writes disk.
#[derive(Debug)]
pub struct SettingsStore {
    settings: Settings,
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn ephemeral() -> Self {
        Self {
            settings: Settings::default(),
            path: None,
        }
    }

    pub fn with_file(path: &Path) -> Self {
        Self {
            settings: Settings::default(),
            path: Some(path.to_path_buf()),
        }
    }

    /// Loads from `path`, creating the file with defaults when missing. A
    /// file that cannot be parsed is left alone and defaults are used.
    pub fn load_or_ephemeral(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            warn!("Could not determine config directory, using default settings");
            return Self::ephemeral();
        };
        let mut store = Self::with_file(path);

        if !path.exists() {
            info!("Settings file not found, creating with defaults at {path:?}");
            store.save();
            return store;
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
                Ok(mut settings) => {
                    debug!("Loaded settings from {path:?}");
                    let mut dirty = false;
                    if settings.version < CURRENT_VERSION {
                        migrate_settings(&mut settings);
                        dirty = true;
                    }
                    dirty |= settings.clamp();
                    store.settings = settings;
                    if dirty {
                        store.save();
                    }
                }
                Err(e) => error!("Failed to parse settings file {path:?}: {e}"),
            },
            Err(e) => error!("Failed to read settings file {path:?}: {e}"),
        }
        store
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Applies `change` and persists the result.
    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) {
        change(&mut self.settings);
        self.save();
    }

    pub fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = save_settings_to_file(&self.settings, path) {
            error!("Failed to save settings to {path:?}: {e}");
        }
    }
}

fn save_settings_to_file(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_yaml::to_string(settings)?;
    fs::write(path, content)?;
    debug!("Saved settings to {path:?}");
    Ok(())
}

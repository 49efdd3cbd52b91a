/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::movement::{MovementRules, DEFAULT_MAX_FALL_CHECK};

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub rules: RulesConfig,
    pub levels_dir: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

/// Task durations, in scheduler ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub move_ticks: u32,
    pub push_ticks: u32,          // walking while pushing is slower
    pub climb_ticks: u32,         // ladder step or step-up
    pub fall_ticks_per_tile: u32,
    pub interact_ticks: u32,
    pub wait_ticks: u32,          // Wait task issued by the input layer
    pub reset_ticks: u32,         // rewind animation at round reset
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    pub max_fall_check: u32,
}

impl RulesConfig {
    pub fn movement(&self) -> MovementRules {
        MovementRules { max_fall_check: self.max_fall_check }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_move_ticks")]
    move_ticks: u32,
    #[serde(default = "default_push_ticks")]
    push_ticks: u32,
    #[serde(default = "default_climb_ticks")]
    climb_ticks: u32,
    #[serde(default = "default_fall_ticks")]
    fall_ticks_per_tile: u32,
    #[serde(default = "default_interact_ticks")]
    interact_ticks: u32,
    #[serde(default = "default_wait_ticks")]
    wait_ticks: u32,
    #[serde(default = "default_reset_ticks")]
    reset_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_max_fall_check")]
    max_fall_check: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_filter")]
    log_filter: String,
}

// ── Defaults ──

fn default_move_ticks() -> u32 { 6 }
fn default_push_ticks() -> u32 { 9 }     // push speed ~0.66 of a walk
fn default_climb_ticks() -> u32 { 6 }
fn default_fall_ticks() -> u32 { 2 }
fn default_interact_ticks() -> u32 { 4 }
fn default_wait_ticks() -> u32 { 6 }
fn default_reset_ticks() -> u32 { 12 }
fn default_max_fall_check() -> u32 { DEFAULT_MAX_FALL_CHECK }
fn default_levels_dir() -> String { "levels".into() }
fn default_log_filter() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            move_ticks: default_move_ticks(),
            push_ticks: default_push_ticks(),
            climb_ticks: default_climb_ticks(),
            fall_ticks_per_tile: default_fall_ticks(),
            interact_ticks: default_interact_ticks(),
            wait_ticks: default_wait_ticks(),
            reset_ticks: default_reset_ticks(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules { max_fall_check: default_max_fall_check() }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_filter: default_log_filter(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TomlTiming::default().into()
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig { max_fall_check: DEFAULT_MAX_FALL_CHECK }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl From<TomlTiming> for TimingConfig {
    fn from(t: TomlTiming) -> Self {
        // A zero-length task would never yield to the next tick
        TimingConfig {
            move_ticks: t.move_ticks.max(1),
            push_ticks: t.push_ticks.max(1),
            climb_ticks: t.climb_ticks.max(1),
            fall_ticks_per_tile: t.fall_ticks_per_tile,
            interact_ticks: t.interact_ticks.max(1),
            wait_ticks: t.wait_ticks.max(1),
            reset_ticks: t.reset_ticks.max(1),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/rewinder`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text. Relative `levels_dir` stays relative.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    /// Read and parse a specific config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        GameConfig::from_toml_str(&text)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            // Search candidate dirs for the levels folder
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            timing: toml_cfg.timing.into(),
            rules: RulesConfig { max_fall_check: toml_cfg.rules.max_fall_check },
            levels_dir,
            log_filter: toml_cfg.general.log_filter,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/rewinder)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/rewinder");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read config file");
                }
            }
        }
    }
    TomlConfig::default()
}

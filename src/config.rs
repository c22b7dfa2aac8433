/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.config/brain-train`, unless a path is given explicitly.
/// Missing keys fall back to defaults. A file that is found by search
/// but cannot be parsed also falls back (with a warning); an explicit
/// path that cannot be read or parsed is an error.

use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

use crate::sim::engine::Timing;

const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: Timing,
    /// Main loop sleep between frames.
    pub frame_ms: u64,
    pub gamepad: GamepadConfig,
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
    pub seed: Option<u64>,
    pub mute: bool,
    /// File the settings came from, if any.
    pub source: Option<PathBuf>,
    /// Problems met while searching, reported once logging is up.
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct GamepadConfig {
    pub select: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct TomlConfig {
    timing: TomlTiming,
    gamepad: TomlGamepad,
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlTiming {
    level_seconds: u32,
    mistake_flash_ms: u64,
    expiry_penalty_ms: u64,
    blink_interval_ms: u64,
    celebration_ms: u64,
    overlay_ms: u64,
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlGamepad {
    select: Vec<String>,
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlGeneral {
    log_file: Option<String>,
    log_level: String,
    seed: Option<u64>,
    mute: bool,
}

// ── Defaults ──

impl Default for TomlTiming {
    fn default() -> Self {
        let t = Timing::default();
        TomlTiming {
            level_seconds: t.level_seconds,
            mistake_flash_ms: t.mistake_flash_ms,
            expiry_penalty_ms: t.expiry_penalty_ms,
            blink_interval_ms: t.blink_interval_ms,
            celebration_ms: t.celebration_ms,
            overlay_ms: t.overlay_ms,
            frame_ms: 10,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            select: vec!["A".into(), "B".into()],
            quit: vec!["Select".into()],
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            log_file: None,
            log_level: "info".into(),
            seed: None,
            mute: false,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load from an explicit path, or search the usual places.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let found = match explicit {
            Some(path) => Found {
                cfg: read_toml(path)?,
                path: Some(path.to_path_buf()),
                warnings: vec![],
            },
            None => search_toml(&candidate_dirs()),
        };
        let mut config = GameConfig::from_toml(found.cfg)?;
        config.source = found.path;
        config.warnings = found.warnings;
        Ok(config)
    }

    /// Command-line values win over the file. `mute` can only be
    /// switched on from the command line.
    pub fn apply_cli(
        &mut self,
        seed: Option<u64>,
        log_file: Option<PathBuf>,
        log_level: Option<&str>,
        mute: bool,
    ) -> Result<(), ConfigError> {
        if seed.is_some() {
            self.seed = seed;
        }
        if log_file.is_some() {
            self.log_file = log_file;
        }
        if let Some(level) = log_level {
            self.log_level = parse_level(level)?;
        }
        self.mute |= mute;
        Ok(())
    }

    /// Parse config text directly (no file lookup).
    #[cfg(test)]
    fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg = toml::from_str::<TomlConfig>(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        GameConfig::from_toml(cfg)
    }

    fn from_toml(cfg: TomlConfig) -> Result<Self, ConfigError> {
        let t = cfg.timing;
        // Zero durations would stall the blink loop or skip phases entirely.
        let timing = Timing {
            level_seconds: t.level_seconds.max(1),
            mistake_flash_ms: t.mistake_flash_ms.max(1),
            expiry_penalty_ms: t.expiry_penalty_ms.max(1),
            blink_interval_ms: t.blink_interval_ms.max(1),
            celebration_ms: t.celebration_ms.max(1),
            overlay_ms: t.overlay_ms.max(1),
        };
        Ok(GameConfig {
            timing,
            frame_ms: t.frame_ms.clamp(1, 100),
            gamepad: GamepadConfig {
                select: cfg.gamepad.select,
                quit: cfg.gamepad.quit,
            },
            log_file: cfg.general.log_file.map(PathBuf::from),
            log_level: parse_level(&cfg.general.log_level)?,
            seed: cfg.general.seed,
            mute: cfg.general.mute,
            source: None,
            warnings: vec![],
        })
    }
}

fn parse_level(s: &str) -> Result<LevelFilter, ConfigError> {
    s.parse::<LevelFilter>()
        .map_err(|_| ConfigError::LogLevel(s.to_string()))
}

/// Candidate directories to search: exe dir, CWD, then
/// `~/.config/brain-train` (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so an installed link still finds the real dir.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.contains(&cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(home).join(".config/brain-train");
        if xdg.is_dir() && !dirs.contains(&xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

fn read_toml(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Result of searching for a config file.
struct Found {
    cfg: TomlConfig,
    path: Option<PathBuf>,
    warnings: Vec<String>,
}

/// First readable config.toml wins. A parse failure falls back to
/// defaults; an unreadable file is skipped.
fn search_toml(search_dirs: &[PathBuf]) -> Found {
    let mut warnings = vec![];
    for dir in search_dirs {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            continue;
        }
        match read_toml(&path) {
            Ok(cfg) => return Found { cfg, path: Some(path), warnings },
            Err(e @ ConfigError::Parse { .. }) => {
                warnings.push(format!("{e}; using default settings"));
                return Found { cfg: TomlConfig::default(), path: None, warnings };
            }
            Err(e) => warnings.push(e.to_string()),
        }
    }
    Found { cfg: TomlConfig::default(), path: None, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.timing, Timing::default());
        assert_eq!(cfg.frame_ms, 10);
        assert_eq!(cfg.log_level, LevelFilter::Info);
        assert_eq!(cfg.gamepad.select, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(cfg.seed, None);
        assert!(!cfg.mute);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [timing]
            level_seconds = 45

            [general]
            seed = 1234
            log_level = "debug"
            log_file = "brain.log"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timing.level_seconds, 45);
        assert_eq!(cfg.timing.overlay_ms, 1100);
        assert_eq!(cfg.seed, Some(1234));
        assert_eq!(cfg.log_level, LevelFilter::Debug);
        assert_eq!(cfg.log_file, Some(PathBuf::from("brain.log")));
        assert_eq!(cfg.gamepad.quit, vec!["Select".to_string()]);
    }

    #[test]
    fn zero_durations_are_raised() {
        let cfg = GameConfig::from_toml_str(
            "[timing]\nblink_interval_ms = 0\nlevel_seconds = 0\nframe_ms = 0\n",
        )
        .unwrap();
        assert_eq!(cfg.timing.blink_interval_ms, 1);
        assert_eq!(cfg.timing.level_seconds, 1);
        assert_eq!(cfg.frame_ms, 1);
    }

    #[test]
    fn malformed_text_is_parse_error() {
        let err = GameConfig::from_toml_str("[timing\nlevel_seconds = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let err = GameConfig::from_toml_str("[general]\nlog_level = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::LogLevel(ref s) if s == "loud"));
    }

    #[test]
    fn explicit_missing_file_is_read_error() {
        let err = GameConfig::load(Some(Path::new("/definitely/not/here/config.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn explicit_malformed_file_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("brain-train-config-explicit-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        std::fs::write(&path, "[general
seed = ").unwrap();

        let err = GameConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: ref p, .. } if *p == path));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn command_line_overrides_file() {
        let mut cfg = GameConfig::from_toml_str(
            "[general]\nseed = 1\nlog_level = \"warn\"\nlog_file = \"file.log\"\nmute = true\n",
        )
        .unwrap();
        cfg.apply_cli(Some(99), Some(PathBuf::from("cli.log")), Some("trace"), false)
            .unwrap();
        assert_eq!(cfg.seed, Some(99));
        assert_eq!(cfg.log_file, Some(PathBuf::from("cli.log")));
        assert_eq!(cfg.log_level, LevelFilter::Trace);
        // A file that mutes stays muted.
        assert!(cfg.mute);
    }

    #[test]
    fn absent_command_line_values_keep_file() {
        let mut cfg = GameConfig::from_toml_str("[general]\nseed = 7\nlog_level = \"debug\"\n").unwrap();
        cfg.apply_cli(None, None, None, true).unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.log_file, None);
        assert_eq!(cfg.log_level, LevelFilter::Debug);
        assert!(cfg.mute);

        let err = cfg.apply_cli(None, None, Some("chatty"), false).unwrap_err();
        assert!(matches!(err, ConfigError::LogLevel(ref s) if s == "chatty"));
    }

    #[test]
    fn search_skips_dirs_without_config() {
        let dir = std::env::temp_dir().join("brain-train-config-test-empty");
        let found = search_toml(&[dir]);
        assert_eq!(found.cfg.timing.level_seconds, 30);
        assert!(found.path.is_none());
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn search_falls_back_on_parse_error() {
        let dir = std::env::temp_dir().join(format!("brain-train-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), "[timing]\nlevel_seconds = \"soon\"\n").unwrap();

        let found = search_toml(&[dir.clone()]);
        assert_eq!(found.cfg.timing.level_seconds, 30);
        assert!(found.path.is_none());
        assert_eq!(found.warnings.len(), 1);

        std::fs::write(dir.join(CONFIG_FILE), "[timing]\nlevel_seconds = 20\n").unwrap();
        let found = search_toml(&[dir.clone()]);
        assert_eq!(found.cfg.timing.level_seconds, 20);
        assert_eq!(found.path, Some(dir.join(CONFIG_FILE)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

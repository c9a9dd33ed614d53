/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or the
/// user/system data directories. Falls back to defaults if the file is
/// missing or incomplete; problems are collected as warnings and logged once
/// the logger is up.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::action::Trigger;
use crate::domain::reveal::{DURATION_DEFAULT, DURATION_MAX, DURATION_MIN};
use crate::sim::controller::Settings;

const APP_DIR: &str = "pixelated";

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub database: PathBuf,
    pub frame_ms: u64,
    pub log_file: Option<PathBuf>,
    pub settings: Settings,
    pub gamepad: GamepadConfig,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GamepadConfig {
    #[serde(default = "default_pad_confirm")]
    pub confirm: Vec<String>,
    #[serde(default = "default_pad_toggle_pause")]
    pub toggle_pause: Vec<String>,
    #[serde(default = "default_pad_restart")]
    pub restart: Vec<String>,
    #[serde(default = "default_pad_finish")]
    pub finish: Vec<String>,
    #[serde(default = "default_pad_quit")]
    pub quit: Vec<String>,
    #[serde(default = "default_pad_duration_up")]
    pub duration_up: Vec<String>,
    #[serde(default = "default_pad_duration_down")]
    pub duration_down: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    reveal: TomlReveal,
    #[serde(default)]
    input: TomlInput,
    #[serde(default)]
    gamepad: GamepadConfig,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_database")]
    database: String,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_log_file")]
    log_file: String,
}

#[derive(Deserialize, Debug)]
struct TomlReveal {
    #[serde(default = "default_duration")]
    duration_secs: f32,
    #[serde(default = "default_duration_step")]
    duration_step: f32,
}

#[derive(Deserialize, Debug)]
struct TomlInput {
    #[serde(default = "default_win_confirm")]
    win_confirm: String,
}

// ── Defaults ──

fn default_database() -> String { "pixelguessr.db".into() }
fn default_frame_ms() -> u64 { 16 }
fn default_log_file() -> String { "pixelated.log".into() }
fn default_duration() -> f32 { DURATION_DEFAULT }
fn default_duration_step() -> f32 { 0.5 }
fn default_win_confirm() -> String { "edge".into() }

fn default_pad_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_pad_toggle_pause() -> Vec<String> { vec!["X".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Y".into()] }
fn default_pad_finish() -> Vec<String> { vec!["Select".into()] }
fn default_pad_quit() -> Vec<String> { vec!["B".into()] }
fn default_pad_duration_up() -> Vec<String> { vec!["R1".into()] }
fn default_pad_duration_down() -> Vec<String> { vec!["L1".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            database: default_database(),
            frame_ms: default_frame_ms(),
            log_file: default_log_file(),
        }
    }
}

impl Default for TomlReveal {
    fn default() -> Self {
        TomlReveal {
            duration_secs: default_duration(),
            duration_step: default_duration_step(),
        }
    }
}

impl Default for TomlInput {
    fn default() -> Self {
        TomlInput { win_confirm: default_win_confirm() }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            confirm: default_pad_confirm(),
            toggle_pause: default_pad_toggle_pause(),
            restart: default_pad_restart(),
            finish: default_pad_finish(),
            quit: default_pad_quit(),
            duration_up: default_pad_duration_up(),
            duration_down: default_pad_duration_down(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// `database_override` (from the command line) wins over the file.
    pub fn load(database_override: Option<PathBuf>) -> Self {
        let search_dirs = candidate_dirs();
        let mut warnings = Vec::new();
        let toml_cfg = load_toml(&search_dirs, &mut warnings);
        let mut cfg = GameConfig::from_toml(toml_cfg, &search_dirs, warnings);

        if let Some(path) = database_override {
            cfg.database = path;
        }
        cfg
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf], mut warnings: Vec<String>) -> Self {
        let database = resolve_existing(&toml_cfg.general.database, search_dirs);

        let log_file = match toml_cfg.general.log_file.trim() {
            "" => None,
            name if Path::new(name).is_absolute() => Some(PathBuf::from(name)),
            name => Some(data_dir().join(name)),
        };

        let reveal = &toml_cfg.reveal;
        let duration = if !reveal.duration_secs.is_finite() {
            warnings.push(format!(
                "reveal.duration_secs = {} is not a number of seconds; using {DURATION_DEFAULT}",
                reveal.duration_secs,
            ));
            default_duration()
        } else if (DURATION_MIN..=DURATION_MAX).contains(&reveal.duration_secs) {
            reveal.duration_secs
        } else {
            warnings.push(format!(
                "reveal.duration_secs = {} is outside {DURATION_MIN}..={DURATION_MAX}; clamping",
                reveal.duration_secs,
            ));
            reveal.duration_secs.clamp(DURATION_MIN, DURATION_MAX)
        };
        let duration_step = if reveal.duration_step > 0.0 {
            reveal.duration_step
        } else {
            warnings.push(format!("reveal.duration_step = {} must be positive", reveal.duration_step));
            default_duration_step()
        };

        let win_confirm = Trigger::from_name(&toml_cfg.input.win_confirm).unwrap_or_else(|| {
            warnings.push(format!(
                "input.win_confirm = {:?} is not \"edge\" or \"level\"",
                toml_cfg.input.win_confirm,
            ));
            Trigger::Edge
        });

        GameConfig {
            database,
            frame_ms: toml_cfg.general.frame_ms.max(1),
            log_file,
            settings: Settings { duration, duration_step, win_confirm },
            gamepad: toml_cfg.gamepad,
            warnings,
        }
    }
}

/// Relative paths are looked up in the candidate dirs; the first hit wins,
/// otherwise the path stays relative to the CWD.
fn resolve_existing(name: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(name);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(&path))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
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

    // 3. XDG data home (~/.local/share/pixelated)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/pixelated)
    let sys = PathBuf::from("/usr/share").join(APP_DIR);
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Writable directory for the log file: exe dir, then XDG data home, then CWD.
fn data_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ won't be writable
            let probe = parent.join(".write_test_pixelated");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share").join(APP_DIR);
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warnings.push(format!("{} parse error, using defaults: {e}", path.display()));
                    return TomlConfig::default();
                }
            },
            Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
        }
    }
    TomlConfig::default()
}

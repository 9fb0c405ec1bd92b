//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};
use crate::dashboard::model::CardSet;
use crate::dashboard::reveal::RevealProfile;

/// Full dashview configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub reveal: RevealConfig,
    pub cards: CardsConfig,
    pub journal: JournalConfig,
    pub paths: PathsConfig,
}

/// Dwell and animation windows of the state machines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// How long `Loading`/`Skeleton` last before reverting to `Normal`.
    pub transient_dwell_ms: u64,
    /// Cards stay hidden this long after a skeleton ends.
    pub fade_window_ms: u64,
    /// Non-target fade-out before an expanding panel starts to grow.
    pub settle_window_ms: u64,
    /// Duration of the expansion overlay's grow animation.
    pub expand_duration_ms: u64,
    /// Opacity multiplier applied to panels suppressed by an expansion.
    pub suppressed_opacity: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            transient_dwell_ms: 3000,
            fade_window_ms: 150,
            settle_window_ms: 50,
            expand_duration_ms: 300,
            suppressed_opacity: 0.35,
        }
    }
}

impl TimingConfig {
    #[must_use]
    pub const fn transient_dwell(&self) -> Duration {
        Duration::from_millis(self.transient_dwell_ms)
    }

    #[must_use]
    pub const fn fade_window(&self) -> Duration {
        Duration::from_millis(self.fade_window_ms)
    }

    #[must_use]
    pub const fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    #[must_use]
    pub const fn expand_duration(&self) -> Duration {
        Duration::from_millis(self.expand_duration_ms)
    }
}

/// The two reveal profiles, selected by transition origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RevealConfig {
    /// First paint, explicit `Normal`, or recovery from `Loading`.
    pub cold: RevealProfile,
    /// Content replacing skeleton placeholders.
    pub from_skeleton: RevealProfile,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            cold: RevealProfile::cold(),
            from_skeleton: RevealProfile::from_skeleton(),
        }
    }
}

/// Panels of the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CardsConfig {
    pub count: usize,
    /// Optional titles; when given, must match `count`. When empty, the
    /// standard titles are used for the standard count and `cardN` otherwise.
    pub labels: Vec<String>,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            count: CardSet::STANDARD_LABELS.len(),
            labels: Vec::new(),
        }
    }
}

impl CardsConfig {
    /// Build the card set described by this section.
    pub fn card_set(&self) -> Result<CardSet> {
        if !self.labels.is_empty() {
            CardSet::with_labels(self.labels.iter().cloned())
        } else if self.count == CardSet::STANDARD_LABELS.len() {
            Ok(CardSet::standard())
        } else {
            CardSet::new(self.count)
        }
    }
}

/// Transition journal output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JournalConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: data_dir().join("transitions.jsonl"),
            fallback_path: Some(env::temp_dir().join("dashview-transitions.jsonl")),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir()
                .join(".config")
                .join("dashview")
                .join("config.toml"),
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[DV-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("dashview")
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| DashError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(DashError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for journal entries.
    ///
    /// FNV-1a over canonical JSON so the value is stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let timing = &mut self.timing;
        for (name, slot) in [
            ("DASHVIEW_TRANSIENT_DWELL_MS", &mut timing.transient_dwell_ms),
            ("DASHVIEW_FADE_WINDOW_MS", &mut timing.fade_window_ms),
            ("DASHVIEW_SETTLE_WINDOW_MS", &mut timing.settle_window_ms),
            ("DASHVIEW_EXPAND_DURATION_MS", &mut timing.expand_duration_ms),
        ] {
            if let Some(raw) = lookup(name) {
                *slot = parse_env_u64(name, &raw)?;
            }
        }
        if let Some(raw) = lookup("DASHVIEW_SUPPRESSED_OPACITY") {
            timing.suppressed_opacity = parse_env_f32("DASHVIEW_SUPPRESSED_OPACITY", &raw)?;
        }
        if let Some(raw) = lookup("DASHVIEW_CARD_COUNT") {
            let count = parse_env_u64("DASHVIEW_CARD_COUNT", &raw)?;
            self.cards.count = usize::try_from(count).map_err(|error| DashError::ConfigParse {
                context: "env",
                details: format!("DASHVIEW_CARD_COUNT={raw:?}: {error}"),
            })?;
            // An explicit count replaces titles written for another count.
            if self.cards.labels.len() != self.cards.count {
                self.cards.labels.clear();
            }
        }
        if let Some(raw) = lookup("DASHVIEW_JOURNAL_ENABLED") {
            self.journal.enabled = parse_env_bool("DASHVIEW_JOURNAL_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("DASHVIEW_JOURNAL_PATH") {
            self.journal.path = PathBuf::from(raw.trim());
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let t = &self.timing;
        for (name, val) in [
            ("timing.transient_dwell_ms", t.transient_dwell_ms),
            ("timing.fade_window_ms", t.fade_window_ms),
            ("timing.settle_window_ms", t.settle_window_ms),
            ("timing.expand_duration_ms", t.expand_duration_ms),
        ] {
            if val == 0 {
                return Err(DashError::InvalidConfig {
                    details: format!("{name} must be > 0"),
                });
            }
        }
        if !(0.0..=1.0).contains(&t.suppressed_opacity) {
            return Err(DashError::InvalidConfig {
                details: format!(
                    "timing.suppressed_opacity must be in [0,1], got {}",
                    t.suppressed_opacity
                ),
            });
        }

        for (name, profile) in [
            ("reveal.cold", &self.reveal.cold),
            ("reveal.from_skeleton", &self.reveal.from_skeleton),
        ] {
            if profile.duration_ms == 0 {
                return Err(DashError::InvalidConfig {
                    details: format!("{name}.duration_ms must be > 0"),
                });
            }
            if !profile.initial_offset_px.is_finite() {
                return Err(DashError::InvalidConfig {
                    details: format!("{name}.initial_offset_px must be finite"),
                });
            }
        }

        if self.cards.count == 0 {
            return Err(DashError::InvalidConfig {
                details: "cards.count must be >= 1".to_string(),
            });
        }
        if !self.cards.labels.is_empty() && self.cards.labels.len() != self.cards.count {
            return Err(DashError::InvalidConfig {
                details: format!(
                    "cards.labels has {} entries but cards.count is {}",
                    self.cards.labels.len(),
                    self.cards.count
                ),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|error| DashError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_f32(name: &str, raw: &str) -> Result<f32> {
    raw.trim().parse::<f32>().map_err(|error| DashError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.trim().parse::<bool>().map_err(|error| DashError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

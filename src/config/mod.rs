use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queue::SeedPolicy;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "NotesTui";
const APP_NAME: &str = "reviewq";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("REVIEWQ_CONFIG").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        Ok(Self {
            config_dir,
            config_file,
        })
    }

    /// Lays every path out beneath `root`; used by tests and portable installs.
    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).with_context(|| {
            format!("creating config directory {}", self.config_dir.display())
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("review queue lookahead must be at least one day (got {0})")]
    LookaheadTooShort(u32),
    #[error("base ease must be at least 130 (got {0})")]
    BaseEaseTooLow(u32),
    #[error("lapse interval change must be between 0.01 and 0.99 (got {0})")]
    LapseIntervalOutOfRange(f64),
    #[error("easy bonus must be at least 1.0 (got {0})")]
    EasyBonusTooLow(f64),
    #[error("maximum interval must be at least one day (got {0})")]
    MaximumIntervalTooShort(u32),
    #[error("maximum link contribution must be between 0 and 1 (got {0})")]
    LinkFactorOutOfRange(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub notes: NoteReviewSettings,
    pub ui: UiPreferences,
    pub algorithm: AlgorithmSettings,
    pub logging: LoggingSettings,
}

impl AppConfig {
    pub fn lookahead_days(&self) -> u32 {
        self.notes.max_n_days_review_queue
    }

    pub fn seed_policy(&self) -> SeedPolicy {
        if self.ui.initially_expand_all_subdecks_in_tree {
            SeedPolicy::ExpandAll
        } else {
            SeedPolicy::DeckAndToday
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.issues().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resets every out-of-range value to its default and reports what was reset.
    pub fn sanitize(&mut self) -> Vec<ConfigError> {
        let issues = self.issues();
        let notes = NoteReviewSettings::default();
        let algorithm = AlgorithmSettings::default();
        for issue in &issues {
            match issue {
                ConfigError::LookaheadTooShort(_) => {
                    self.notes.max_n_days_review_queue = notes.max_n_days_review_queue
                }
                ConfigError::BaseEaseTooLow(_) => self.algorithm.base_ease = algorithm.base_ease,
                ConfigError::LapseIntervalOutOfRange(_) => {
                    self.algorithm.lapses_interval_change = algorithm.lapses_interval_change
                }
                ConfigError::EasyBonusTooLow(_) => {
                    self.algorithm.easy_bonus = algorithm.easy_bonus
                }
                ConfigError::MaximumIntervalTooShort(_) => {
                    self.algorithm.maximum_interval = algorithm.maximum_interval
                }
                ConfigError::LinkFactorOutOfRange(_) => {
                    self.algorithm.max_link_factor = algorithm.max_link_factor
                }
            }
        }
        issues
    }

    fn issues(&self) -> Vec<ConfigError> {
        let mut issues = Vec::new();
        if self.notes.max_n_days_review_queue < 1 {
            issues.push(ConfigError::LookaheadTooShort(
                self.notes.max_n_days_review_queue,
            ));
        }
        let algo = &self.algorithm;
        if algo.base_ease < 130 {
            issues.push(ConfigError::BaseEaseTooLow(algo.base_ease));
        }
        if !(0.01..=0.99).contains(&algo.lapses_interval_change) {
            issues.push(ConfigError::LapseIntervalOutOfRange(
                algo.lapses_interval_change,
            ));
        }
        if algo.easy_bonus.is_nan() || algo.easy_bonus < 1.0 {
            issues.push(ConfigError::EasyBonusTooLow(algo.easy_bonus));
        }
        if algo.maximum_interval < 1 {
            issues.push(ConfigError::MaximumIntervalTooShort(algo.maximum_interval));
        }
        if !(0.0..=1.0).contains(&algo.max_link_factor) {
            issues.push(ConfigError::LinkFactorOutOfRange(algo.max_link_factor));
        }
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteReviewSettings {
    pub enable_note_review_pane_on_startup: bool,
    pub tags_to_review: Vec<String>,
    pub note_folders_to_ignore: Vec<String>,
    pub open_random_note: bool,
    pub auto_next_note: bool,
    pub disable_file_menu_review_options: bool,
    /// Days ahead for which scheduled notes are still listed.
    pub max_n_days_review_queue: u32,
}

impl Default for NoteReviewSettings {
    fn default() -> Self {
        Self {
            enable_note_review_pane_on_startup: true,
            tags_to_review: vec!["#review".to_string()],
            note_folders_to_ignore: Vec::new(),
            open_random_note: false,
            auto_next_note: false,
            disable_file_menu_review_options: false,
            max_n_days_review_queue: 365,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPreferences {
    /// Starts every deck and bucket of the review pane expanded instead of
    /// only each deck and its "Today" bucket.
    pub initially_expand_all_subdecks_in_tree: bool,
}

/// Scheduler tuning. Validated here, applied by the external scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmSettings {
    pub base_ease: u32,
    pub lapses_interval_change: f64,
    pub easy_bonus: f64,
    pub maximum_interval: u32,
    pub max_link_factor: f64,
}

impl Default for AlgorithmSettings {
    fn default() -> Self {
        Self {
            base_ease: 250,
            lapses_interval_change: 0.5,
            easy_bonus: 1.3,
            maximum_interval: 36525,
            max_link_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub show_debug_messages: bool,
}

impl LoggingSettings {
    pub fn default_level(&self) -> &'static str {
        if self.show_debug_messages {
            "debug"
        } else {
            "info"
        }
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Area, Landmark, MatchMode, Point};

const WEBHOOK_PREFIX: &str = "https://discord.com/api/webhooks/";
/// Longest accepted lobby poll, in seconds.
pub const MAX_SCAN_INTERVAL: f64 = 60.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Template image per landmark. Missing keys in the file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Landmarks {
    pub change: PathBuf,
    pub br_mode: PathBuf,
    pub solo_mode: PathBuf,
    pub return_to_lobby_alone: PathBuf,
    pub ultimate: PathBuf,
    pub open: PathBuf,
    #[serde(rename = "continue")]
    pub continue_: PathBuf,
}

impl Default for Landmarks {
    fn default() -> Self {
        Self {
            change: "change.png".into(),
            br_mode: "br_mode.png".into(),
            solo_mode: "solo_mode.png".into(),
            return_to_lobby_alone: "leave.png".into(),
            ultimate: "ultimate.png".into(),
            open: "open.png".into(),
            continue_: "continue.png".into(),
        }
    }
}

impl Landmarks {
    pub fn path(&self, landmark: Landmark) -> &Path {
        match landmark {
            Landmark::Change => &self.change,
            Landmark::BattleRoyale => &self.br_mode,
            Landmark::Solo => &self.solo_mode,
            Landmark::Leave => &self.return_to_lobby_alone,
            Landmark::Ultimate => &self.ultimate,
            Landmark::Open => &self.open,
            Landmark::Continue => &self.continue_,
        }
    }

    pub fn set(&mut self, landmark: Landmark, path: PathBuf) {
        let slot = match landmark {
            Landmark::Change => &mut self.change,
            Landmark::BattleRoyale => &mut self.br_mode,
            Landmark::Solo => &mut self.solo_mode,
            Landmark::Leave => &mut self.return_to_lobby_alone,
            Landmark::Ultimate => &mut self.ultimate,
            Landmark::Open => &mut self.open,
            Landmark::Continue => &mut self.continue_,
        };
        *slot = path;
    }
}

/// Physical key per in-game action, for non-QWERTY layouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMap {
    pub menu: String,
    pub slot_1: String,
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            menu: "m".into(),
            slot_1: "1".into(),
            forward: "w".into(),
            backward: "s".into(),
            left: "a".into(),
            right: "d".into(),
        }
    }
}

impl KeyMap {
    pub fn movement(&self) -> [&str; 4] {
        [&self.forward, &self.left, &self.backward, &self.right]
    }
}

/// Everything a run reads. Loaded once at start, edited only between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub discord_webhook: String,
    pub confidence: f32,
    /// Seconds between Scanning ticks
    pub scan_interval: f64,
    pub match_mode: MatchMode,
    pub images: Landmarks,
    pub pos_1: Point,
    pub pos_2: Point,
    /// Crop for the outcome screenshot; full screen when unset
    pub outcome_area: Option<Area>,
    pub keys: KeyMap,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            discord_webhook: String::new(),
            confidence: 0.8,
            scan_interval: 2.0,
            match_mode: MatchMode::Full,
            images: Landmarks::default(),
            pos_1: Point::new(100, 100),
            pos_2: Point::new(200, 200),
            outcome_area: None,
            keys: KeyMap::default(),
        }
    }
}

impl RunConfig {
    /// Load and merge against defaults. A missing or broken file yields defaults.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(cfg) => cfg,
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), "{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.1..=1.0).contains(&self.confidence) {
            return Err(ConfigError::Invalid(format!(
                "confidence {:.2} outside 0.1..=1.0",
                self.confidence
            )));
        }
        if !(self.scan_interval > 0.0 && self.scan_interval <= MAX_SCAN_INTERVAL) {
            return Err(ConfigError::Invalid(format!(
                "scan_interval must be in (0, {}], got {}",
                MAX_SCAN_INTERVAL, self.scan_interval
            )));
        }
        let hook = self.discord_webhook.trim();
        if !hook.is_empty() && !hook.starts_with(WEBHOOK_PREFIX) {
            return Err(ConfigError::Invalid(format!(
                "webhook must start with {}",
                WEBHOOK_PREFIX
            )));
        }
        Ok(())
    }

    /// Nudge confidence by `delta`, kept within the accepted range.
    pub fn adjust_confidence(&mut self, delta: f32) {
        let next = ((self.confidence + delta) * 100.0).round() / 100.0;
        self.confidence = next.clamp(0.1, 1.0);
    }
}

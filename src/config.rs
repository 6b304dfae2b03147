//! Settings document
//!
//! The settings are a flat JSON (or YAML) document. Keys this crate does not
//! use, such as the video layout options of the editor that writes the file,
//! are carried through untouched so a load/save cycle preserves them.
//!
//! ```rust
//! use paddock::config::Settings;
//!
//! let settings: Settings = r#"{
//!     "source_telemetry": "captures/race1.capture",
//!     "participant_config": { "amy_r": { "display": "Amy Rivers", "team": "Blue" } },
//!     "font_size": 15
//! }"#.parse().unwrap();
//!
//! assert_eq!(settings.display_name("amy_r"), "Amy Rivers");
//! assert_eq!(settings.display_name("bob"), "bob");
//! assert_eq!(settings.bind_address(), "0.0.0.0:5606");
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Result, TelemetryError};

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5606";
pub const DEFAULT_REPLAY_RATE_HZ: f64 = 60.0;

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_replay_rate_hz() -> f64 {
    DEFAULT_REPLAY_RATE_HZ
}

fn default_include_incomplete() -> bool {
    true
}

/// Presentation overrides for one driver, keyed by telemetry name.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticipantConfig {
    /// Full display name.
    pub display: Option<String>,
    /// Abbreviated display name.
    pub short_display: Option<String>,
    pub car: Option<String>,
    pub team: Option<String>,
    /// Series points carried into the event.
    pub points: Option<i64>,
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_telemetry: Option<PathBuf>,
    #[serde(default = "default_bind_address")]
    bind_address: String,
    #[serde(default = "default_replay_rate_hz")]
    replay_rate_hz: f64,
    #[serde(default = "default_include_incomplete")]
    include_incomplete_races: bool,
    #[serde(default)]
    participant_config: BTreeMap<String, ParticipantConfig>,
    /// Keys not interpreted here, kept for round-tripping.
    #[serde(flatten)]
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_telemetry: None,
            bind_address: default_bind_address(),
            replay_rate_hz: default_replay_rate_hz(),
            include_incomplete_races: default_include_incomplete(),
            participant_config: BTreeMap::new(),
            unknown_fields: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON or YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))?;
        let settings: Settings = text.parse()?;
        debug!(
            "Loaded settings from {} ({} participant overrides)",
            path.display(),
            settings.participant_config.len()
        );
        Ok(settings)
    }

    /// Write the settings back out as YAML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_yaml()?;
        std::fs::write(path, text).map_err(|e| TelemetryError::file_error(path.to_path_buf(), e))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self)
            .map_err(|e| TelemetryError::config_error("settings serialization", e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if !(self.replay_rate_hz.is_finite() && self.replay_rate_hz > 0.0) {
            return Err(TelemetryError::config_error(
                "replay_rate_hz",
                format!("must be a positive rate, got {}", self.replay_rate_hz),
            ));
        }
        if self.bind_address.trim().is_empty() {
            return Err(TelemetryError::config_error("bind_address", "must not be empty"));
        }
        Ok(())
    }

    pub fn source_telemetry(&self) -> Option<&Path> {
        self.source_telemetry.as_deref()
    }

    pub fn set_source_telemetry(&mut self, path: impl Into<PathBuf>) {
        self.source_telemetry = Some(path.into());
    }

    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn set_bind_address(&mut self, address: impl Into<String>) {
        self.bind_address = address.into();
    }

    pub fn replay_rate_hz(&self) -> f64 {
        self.replay_rate_hz
    }

    pub fn set_replay_rate_hz(&mut self, rate: f64) -> Result<()> {
        let previous = std::mem::replace(&mut self.replay_rate_hz, rate);
        self.validate().inspect_err(|_| self.replay_rate_hz = previous)
    }

    pub fn include_incomplete_races(&self) -> bool {
        self.include_incomplete_races
    }

    pub fn set_include_incomplete_races(&mut self, include: bool) {
        self.include_incomplete_races = include;
    }

    pub fn participant_config(&self) -> &BTreeMap<String, ParticipantConfig> {
        &self.participant_config
    }

    pub fn participant(&self, telemetry_name: &str) -> Option<&ParticipantConfig> {
        self.participant_config.get(telemetry_name)
    }

    pub fn set_participant(&mut self, telemetry_name: impl Into<String>, config: ParticipantConfig) {
        self.participant_config.insert(telemetry_name.into(), config);
    }

    /// Display name for a driver, falling back to the telemetry name.
    pub fn display_name<'a>(&'a self, telemetry_name: &'a str) -> &'a str {
        self.participant(telemetry_name)
            .and_then(|config| config.display.as_deref())
            .filter(|display| !display.is_empty())
            .unwrap_or(telemetry_name)
    }

    /// Value of a key this crate does not interpret.
    pub fn extra(&self, key: &str) -> Option<&serde_yaml_ng::Value> {
        self.unknown_fields.get(key)
    }
}

impl FromStr for Settings {
    type Err = TelemetryError;

    /// Parse a JSON or YAML settings document.
    fn from_str(text: &str) -> Result<Self> {
        let settings: Settings = serde_yaml_ng::from_str(text)
            .map_err(|e| TelemetryError::config_error("settings document", e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, ensure};

    #[test]
    fn empty_document_uses_defaults() -> anyhow::Result<()> {
        let settings: Settings = "{}".parse()?;
        ensure!(settings == Settings::default());
        ensure!(settings.source_telemetry().is_none());
        ensure!(settings.replay_rate_hz() == DEFAULT_REPLAY_RATE_HZ);
        ensure!(settings.include_incomplete_races());
        Ok(())
    }

    #[test]
    fn yaml_and_json_are_both_accepted() -> anyhow::Result<()> {
        let yaml: Settings = "source_telemetry: race.capture\nreplay_rate_hz: 30\n".parse()?;
        let json: Settings = r#"{"source_telemetry": "race.capture", "replay_rate_hz": 30}"#.parse()?;
        ensure!(yaml == json);
        ensure!(yaml.source_telemetry() == Some(Path::new("race.capture")));
        Ok(())
    }

    #[test]
    fn participant_overrides() -> anyhow::Result<()> {
        let settings: Settings = r#"
participant_config:
  amy_r:
    display: Amy Rivers
    short_display: Rivers
    car: Formula Rookie
    team: Blue
    points: 25
  bob:
    display: ""
"#
        .parse()?;

        let amy = settings.participant("amy_r").context("amy")?;
        ensure!(amy.team.as_deref() == Some("Blue"));
        ensure!(amy.points == Some(25));
        ensure!(settings.display_name("amy_r") == "Amy Rivers");
        ensure!(settings.display_name("bob") == "bob");
        ensure!(settings.display_name("cy") == "cy");
        Ok(())
    }

    #[test]
    fn invalid_documents_are_config_errors() {
        for text in ["replay_rate_hz: [1, 2]", "replay_rate_hz: 0", "bind_address: ' '", "[1, 2, 3]"] {
            let err = text.parse::<Settings>().unwrap_err();
            assert!(matches!(err, TelemetryError::Config { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn setters_validate() {
        let mut settings = Settings::default();
        assert!(settings.set_replay_rate_hz(-5.0).is_err());
        assert_eq!(settings.replay_rate_hz(), DEFAULT_REPLAY_RATE_HZ);
        assert!(settings.set_replay_rate_hz(120.0).is_ok());
        assert_eq!(settings.replay_rate_hz(), 120.0);

        settings.set_bind_address("127.0.0.1:5607");
        settings.set_include_incomplete_races(false);
        settings.set_source_telemetry("a.capture");
        settings.set_participant("amy", ParticipantConfig { display: Some("Amy".into()), ..Default::default() });
        assert_eq!(settings.bind_address(), "127.0.0.1:5607");
        assert!(!settings.include_incomplete_races());
        assert_eq!(settings.display_name("amy"), "Amy");
    }

    #[test]
    fn unknown_keys_survive_a_save() -> anyhow::Result<()> {
        let settings: Settings = "font_size: 15\nheading_text: Round 3\n".parse()?;
        ensure!(settings.extra("font_size").and_then(|v| v.as_u64()) == Some(15));

        let path = std::env::temp_dir().join(format!("paddock-settings-{}.yaml", std::process::id()));
        settings.save(&path)?;
        let reloaded = Settings::load(&path);
        std::fs::remove_file(&path)?;

        let reloaded = reloaded?;
        ensure!(reloaded == settings);
        ensure!(reloaded.extra("heading_text").and_then(|v| v.as_str()) == Some("Round 3"));
        Ok(())
    }
}

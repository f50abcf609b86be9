//! Engine configuration.
//!
//! Every key is optional. Missing keys take their default, unknown keys
//! are ignored, and invalid values are reported and replaced by the
//! default. Reading files is the host's job; the core only parses text
//! it is handed.

use crate::{clock::DEFAULT_MAX_FPS, error::SimResult, tunnel::DEFAULT_TUNNEL_CAPACITY};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub max_frames_per_second: u32,
    pub audio_enabled:         bool,
    pub music_enabled:         bool,
    pub sound_enabled:         bool,
    #[serde(rename = "sound3DEnabled")]
    pub sound_3d_enabled:      bool,
    pub speech_enabled:        bool,
    /// Master seed for every subsystem RNG stream.
    pub seed:                  u64,
    /// Capacity of tunnel networks created by the cave system.
    pub tunnel_capacity:       usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_frames_per_second: DEFAULT_MAX_FPS,
            audio_enabled:         true,
            music_enabled:         true,
            sound_enabled:         true,
            sound_3d_enabled:      true,
            speech_enabled:        true,
            seed:                  0,
            tunnel_capacity:       DEFAULT_TUNNEL_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON object. Malformed JSON is an error; out-of-range
    /// values are repaired with a warning.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let mut config: EngineConfig = serde_json::from_str(json)?;
        config.validate();
        Ok(config)
    }

    /// Build from flat `key=value` pairs, as read from an INI-style
    /// options file or the command line. Never fails: a value that does
    /// not parse is reported and the default kept.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.trim(), value.trim());
            match key {
                "maxFramesPerSecond" => set_parsed(key, value, &mut config.max_frames_per_second),
                "audioEnabled"       => set_flag(key, value, &mut config.audio_enabled),
                "musicEnabled"       => set_flag(key, value, &mut config.music_enabled),
                "soundEnabled"       => set_flag(key, value, &mut config.sound_enabled),
                "sound3DEnabled"     => set_flag(key, value, &mut config.sound_3d_enabled),
                "speechEnabled"      => set_flag(key, value, &mut config.speech_enabled),
                "seed"               => set_parsed(key, value, &mut config.seed),
                "tunnelCapacity"     => set_parsed(key, value, &mut config.tunnel_capacity),
                _ => log::debug!("config: ignoring unknown key '{key}'"),
            }
        }
        config.validate();
        config
    }

    /// Parse `key=value` lines. Blank lines and `#`/`;` comments are
    /// skipped; a line without `=` is reported and skipped.
    pub fn from_key_value_text(text: &str) -> Self {
        let pairs: Vec<(&str, &str)> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with(';'))
            .filter_map(|line| {
                let pair = line.split_once('=');
                if pair.is_none() {
                    log::warn!("config: malformed line '{line}' skipped");
                }
                pair
            })
            .collect();
        Self::from_pairs(pairs)
    }

    /// Replace invalid values by their defaults. Returns how many were
    /// replaced.
    pub fn validate(&mut self) -> usize {
        let defaults = Self::default();
        let mut repaired = 0;
        if self.max_frames_per_second == 0 {
            log::warn!(
                "config: maxFramesPerSecond must be positive; using {}",
                defaults.max_frames_per_second
            );
            self.max_frames_per_second = defaults.max_frames_per_second;
            repaired += 1;
        }
        if self.tunnel_capacity == 0 {
            log::warn!(
                "config: tunnelCapacity must be positive; using {}",
                defaults.tunnel_capacity
            );
            self.tunnel_capacity = defaults.tunnel_capacity;
            repaired += 1;
        }
        repaired
    }
}

fn set_parsed<T: std::str::FromStr>(key: &str, value: &str, slot: &mut T) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => log::warn!("config: '{value}' is not a valid {key}; keeping default"),
    }
}

fn set_flag(key: &str, value: &str, slot: &mut bool) {
    match parse_flag(value) {
        Some(flag) => *slot = flag,
        None => log::warn!("config: '{value}' is not a valid {key}; keeping default"),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::queue::QueueOptions;
use crate::session::Pacing;

pub const CONFIG_FILE_NAME: &str = "namedrill.toml";

/// Settings read from `namedrill.toml` in the data directory. Every key is
/// optional.
#[derive(Deserialize, Default, PartialEq, Debug)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub pacing: PacingConfig,
    pub queue: QueueConfig,
    pub server: ServerConfig,
}

#[derive(Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields, default)]
pub struct PacingConfig {
    pub choice_correct_ms: u64,
    pub choice_wrong_ms: u64,
    pub speed_correct_ms: u64,
    pub speed_wrong_ms: u64,
    pub speed_duration_secs: u32,
}

#[derive(Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields, default)]
pub struct QueueConfig {
    pub max_items: usize,
    pub choice_count: usize,
}

#[derive(Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    pub port: u16,
    pub open_browser: bool,
}

impl Default for PacingConfig {
    fn default() -> Self {
        let pacing = Pacing::default();
        Self {
            choice_correct_ms: pacing.choice_correct_ms,
            choice_wrong_ms: pacing.choice_wrong_ms,
            speed_correct_ms: pacing.speed_correct_ms,
            speed_wrong_ms: pacing.speed_wrong_ms,
            speed_duration_secs: pacing.speed_duration_secs,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        let options = QueueOptions::default();
        Self {
            max_items: options.max_items,
            choice_count: options.choice_count,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            open_browser: true,
        }
    }
}

impl Config {
    /// Load the config file in `directory`, or the defaults if there is none.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("No config file, using defaults.");
            return Ok(Self::default());
        }
        log::debug!("Loading config from {}", path.display());
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Fallible<()> {
        if self.queue.choice_count < 2 {
            return fail("queue.choice_count must be at least 2.");
        }
        if self.queue.max_items == 0 {
            return fail("queue.max_items must be at least 1.");
        }
        if self.pacing.speed_duration_secs == 0 {
            return fail("pacing.speed_duration_secs must be at least 1.");
        }
        Ok(())
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            choice_correct_ms: self.pacing.choice_correct_ms,
            choice_wrong_ms: self.pacing.choice_wrong_ms,
            speed_correct_ms: self.pacing.speed_correct_ms,
            speed_wrong_ms: self.pacing.speed_wrong_ms,
            speed_duration_secs: self.pacing.speed_duration_secs,
        }
    }

    pub fn queue_options(&self) -> QueueOptions {
        QueueOptions {
            max_items: self.queue.max_items,
            choice_count: self.queue.choice_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use super::*;
    use crate::helper::create_tmp_directory;

    #[test]
    fn test_defaults_match_behaviour() {
        let config = Config::default();
        assert_eq!(config.pacing(), Pacing::default());
        assert_eq!(config.queue_options(), QueueOptions::default());
        assert_eq!(config.server.port, 8000);
        assert!(config.server.open_browser);
    }

    #[test]
    fn test_partial_file() -> Fallible<()> {
        let config = Config::parse(
            r#"
            [pacing]
            choice_wrong_ms = 2000

            [server]
            open_browser = false
            "#,
        )?;
        assert_eq!(config.pacing.choice_wrong_ms, 2000);
        assert_eq!(config.pacing.choice_correct_ms, 500);
        assert_eq!(config.queue.max_items, 20);
        assert!(!config.server.open_browser);
        Ok(())
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("[queue]\nmax_cards = 3\n").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::parse("[queue]\nchoice_count = 1\n").is_err());
        assert!(Config::parse("[queue]\nmax_items = 0\n").is_err());
        assert!(Config::parse("[pacing]\nspeed_duration_secs = 0\n").is_err());
    }

    #[test]
    fn test_load_missing_file() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        assert_eq!(Config::load(&dir)?, Config::default());
        Ok(())
    }

    #[test]
    fn test_load_file() -> Fallible<()> {
        let dir = create_tmp_directory()?;
        write(dir.join(CONFIG_FILE_NAME), "[server]\nport = 9123\n")?;
        assert_eq!(Config::load(&dir)?.server.port, 9123);
        Ok(())
    }
}

use serde::Deserialize;

pub const DEFAULT_HALF_PERIOD: u32 = 1;
pub const DEFAULT_DATA_WORDS: usize = 256;
pub const DEFAULT_MAX_CYCLES: u64 = 10_000;

fn default_half_period() -> u32 {
    DEFAULT_HALF_PERIOD
}
fn default_data_words() -> usize {
    DEFAULT_DATA_WORDS
}
fn default_max_cycles() -> u64 {
    DEFAULT_MAX_CYCLES
}

/// Simulator settings, usually read from a TOML file. Every field has a
/// default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClockConfig {
    /// Ticks per clock level.
    #[serde(default = "default_half_period")]
    pub half_period: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Size of the data memory in words.
    #[serde(default = "default_data_words")]
    pub data_words: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u64,
    /// Print stage occupancy after every cycle.
    #[serde(default)]
    pub trace: bool,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            half_period: DEFAULT_HALF_PERIOD,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            data_words: DEFAULT_DATA_WORDS,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            trace: false,
        }
    }
}

impl SimConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::from_toml("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.memory.data_words, DEFAULT_DATA_WORDS);
        assert_eq!(config.clock.half_period, 1);
    }

    #[test]
    fn test_partial_file() {
        let config = SimConfig::from_toml(
            r#"
            [clock]
            half_period = 3

            [run]
            trace = true
            "#,
        )
        .unwrap();
        assert_eq!(config.clock.half_period, 3);
        assert!(config.run.trace);
        assert_eq!(config.run.max_cycles, DEFAULT_MAX_CYCLES);
    }

    #[test]
    fn test_unknown_key() {
        assert!(SimConfig::from_toml("[memory]\nsize = 3\n").is_err());
    }
}

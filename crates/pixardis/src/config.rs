use serde::Deserialize;

/// VM dimensions, RNG seed and stepping cadence, loadable from a TOML file
/// (SPEC_FULL.md §3, "Config") or built up from CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    pub cycles_per_step: u32,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig { width: 64, height: 48, seed: 0, cycles_per_step: 1_000 }
    }
}

impl VmConfig {
    /// Parses a config file's contents; any field the file omits keeps its
    /// [`Default`] value.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = VmConfig::from_toml("width = 128\n").unwrap();
        assert_eq!(config.width, 128);
        assert_eq!(config.height, VmConfig::default().height);
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = VmConfig::from_toml("").unwrap();
        assert_eq!(config, VmConfig::default());
    }
}

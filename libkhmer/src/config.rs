/// Khmer-specific configuration that extends the base `Config` from core.
///
/// This configuration includes:
/// - All generic options from `libkhmer_core::Config` (flattened via serde)
/// - Where the document library lives on disk
/// - Whether the on-screen keyboard is shown
///
/// # Example
///
/// ```rust
/// use libkhmer::KhmerConfig;
///
/// let config = KhmerConfig::default();
/// assert!(config.base().native_mode);
/// let base_config = config.into_base();
/// ```
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct KhmerConfig {
    /// Base configuration fields (mode, view, store key, quirk overrides)
    #[serde(flatten)]
    pub base: libkhmer_core::Config,

    /// redb file for saved documents; `None` keeps them in memory
    pub store_path: Option<String>,

    /// Show the virtual keyboard
    pub show_virtual_keyboard: bool,
}

impl Default for KhmerConfig {
    fn default() -> Self {
        Self {
            base: libkhmer_core::Config::default(),
            store_path: None,
            show_virtual_keyboard: true,
        }
    }
}

impl KhmerConfig {
    /// Convert this config into the base config
    pub fn into_base(self) -> libkhmer_core::Config {
        self.base
    }

    /// Get a reference to the base config
    pub fn base(&self) -> &libkhmer_core::Config {
        &self.base
    }

    /// Get a mutable reference to the base config
    pub fn base_mut(&mut self) -> &mut libkhmer_core::Config {
        &mut self.base
    }

    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

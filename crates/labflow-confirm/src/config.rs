//! Engine configuration
//!
//! Loaded from TOML; every field has a production default.
//!
//! ```toml
//! fetal_waste_labware_type = "Fetal waste container"
//! thickness_measurement = "Thickness"
//! require_work_number = false
//! ```

use crate::error::ConfirmError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Confirmation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Labware type whose sections carry no section number
    pub fetal_waste_labware_type: String,
    /// Measurement name recorded for plan thickness values
    pub thickness_measurement: String,
    /// Reject requests without a work number
    pub require_work_number: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfirmError::Config`] if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfirmError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfirmError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns [`ConfirmError::Config`] on malformed TOML
    pub fn from_toml(text: &str) -> Result<Self, ConfirmError> {
        toml::from_str(text).map_err(|e| ConfirmError::Config(e.to_string()))
    }

    /// With fetal waste labware type name
    #[inline]
    #[must_use]
    pub fn with_fetal_waste_labware_type(mut self, name: impl Into<String>) -> Self {
        self.fetal_waste_labware_type = name.into();
        self
    }

    /// With thickness measurement name
    #[inline]
    #[must_use]
    pub fn with_thickness_measurement(mut self, name: impl Into<String>) -> Self {
        self.thickness_measurement = name.into();
        self
    }

    /// With mandatory work number
    #[inline]
    #[must_use]
    pub fn with_required_work_number(mut self, required: bool) -> Self {
        self.require_work_number = required;
        self
    }

    /// Check if a labware type name is the fetal waste type
    #[inline]
    #[must_use]
    pub fn is_fetal_waste(&self, labware_type_name: &str) -> bool {
        labware_type_name.eq_ignore_ascii_case(&self.fetal_waste_labware_type)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetal_waste_labware_type: "Fetal waste container".to_string(),
            thickness_measurement: "Thickness".to_string(),
            require_work_number: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml("require_work_number = true").unwrap();
        assert!(config.require_work_number);
        assert_eq!(config.thickness_measurement, "Thickness");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "thickness_measurement = \"Section thickness\"").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.thickness_measurement, "Section thickness");
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = EngineConfig::from_toml("require_work_number = ").unwrap_err();
        assert!(matches!(err, ConfirmError::Config(_)));
    }

    #[test]
    fn fetal_waste_match_ignores_case() {
        let config = EngineConfig::new().with_fetal_waste_labware_type("FW tube");
        assert!(config.is_fetal_waste("fw TUBE"));
        assert!(!config.is_fetal_waste("Slide"));
    }
}

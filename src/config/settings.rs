//! User settings for bizlog
//!
//! Holds the diff rendering preferences: separators, the "of" word used to
//! join nested field names, and the message templates for each kind of change.

use serde::{Deserialize, Serialize};

use super::paths::BizlogPaths;
use crate::error::BizlogError;

const FIELD_NAME: &str = "__fieldName";
const SOURCE_VALUE: &str = "__sourceValue";
const TARGET_VALUE: &str = "__targetValue";
const ADD_VALUES: &str = "__addValues";
const DEL_VALUES: &str = "__delValues";

/// Diff rendering preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Placed between rendered fields
    pub field_separator: String,

    /// Placed between items of a rendered list
    pub list_item_separator: String,

    /// Joins a parent field name to a child field name
    pub of_word: String,

    /// Field went from absent to a value
    pub add_template: String,

    /// Field changed from one value to another
    pub update_template: String,

    /// Field went from a value to absent
    pub delete_template: String,

    /// Items added to a list field
    pub list_add_template: String,

    /// Items removed from a list field
    pub list_delete_template: String,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            field_separator: ";".to_string(),
            list_item_separator: ",".to_string(),
            of_word: "'s ".to_string(),
            add_template: "[__fieldName] added: [__targetValue]".to_string(),
            update_template: "[__fieldName] changed from [__sourceValue] to [__targetValue]"
                .to_string(),
            delete_template: "[__fieldName] removed: [__sourceValue]".to_string(),
            list_add_template: "[__fieldName] added [__addValues]".to_string(),
            list_delete_template: "[__fieldName] removed [__delValues]".to_string(),
        }
    }
}

impl DiffSettings {
    pub fn format_add(&self, field_name: &str, target: &str) -> String {
        self.add_template
            .replace(FIELD_NAME, field_name)
            .replace(TARGET_VALUE, target)
    }

    pub fn format_update(&self, field_name: &str, source: &str, target: &str) -> String {
        self.update_template
            .replace(FIELD_NAME, field_name)
            .replace(SOURCE_VALUE, source)
            .replace(TARGET_VALUE, target)
    }

    pub fn format_deleted(&self, field_name: &str, source: &str) -> String {
        self.delete_template
            .replace(FIELD_NAME, field_name)
            .replace(SOURCE_VALUE, source)
    }

    /// Combined add/remove line for a list field; empty when nothing moved
    pub fn format_list(&self, field_name: &str, added: &str, removed: &str) -> String {
        let mut parts = Vec::with_capacity(2);
        if !added.is_empty() {
            parts.push(
                self.list_add_template
                    .replace(FIELD_NAME, field_name)
                    .replace(ADD_VALUES, added),
            );
        }
        if !removed.is_empty() {
            parts.push(
                self.list_delete_template
                    .replace(FIELD_NAME, field_name)
                    .replace(DEL_VALUES, removed),
            );
        }
        parts.join(" ")
    }
}

/// User settings for bizlog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Diff rendering preferences
    #[serde(default)]
    pub diff: DiffSettings,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            diff: DiffSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or fall back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &BizlogPaths) -> Result<Self, BizlogError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| BizlogError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                BizlogError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BizlogPaths) -> Result<(), BizlogError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BizlogError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| BizlogError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.diff.field_separator, ";");
        assert_eq!(settings.diff.list_item_separator, ",");
    }

    #[test]
    fn test_format_templates() {
        let diff = DiffSettings::default();
        assert_eq!(diff.format_add("Title", "A"), "[Title] added: [A]");
        assert_eq!(
            diff.format_update("Title", "A", "B"),
            "[Title] changed from [A] to [B]"
        );
        assert_eq!(diff.format_deleted("Title", "A"), "[Title] removed: [A]");
    }

    #[test]
    fn test_format_list() {
        let diff = DiffSettings::default();
        assert_eq!(
            diff.format_list("Tags", "d", "a"),
            "[Tags] added [d] [Tags] removed [a]"
        );
        assert_eq!(diff.format_list("Tags", "", "a"), "[Tags] removed [a]");
        assert_eq!(diff.format_list("Tags", "", ""), "");
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BizlogPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.diff.of_word = " of ".into();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.diff.of_word, " of ");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BizlogPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"diff": {"field_separator": "\n"}}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.diff.field_separator, "\n");
        assert_eq!(loaded.diff.list_item_separator, ",");
        assert_eq!(loaded.schema_version, 1);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BizlogPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(err.is_config());
    }
}

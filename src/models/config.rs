use serde::{Deserialize, Serialize};

/// Tool settings from `modtools.yaml`.
///
/// Every field has a default, so a partial (or missing) file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Create or update a `.civ5sln` next to each written `.civ5proj`
    pub create_solution: bool,

    /// `import_to_vfs` for files added by `sync-files`
    pub import_new_files: bool,

    pub logging: LoggingSettings,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            create_solution: true,
            import_new_files: false,
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub debug: bool,

    /// Emit console logs as JSON lines
    pub json: bool,

    /// Directory for daily rotating log files; console only when unset
    pub log_dir: Option<String>,

    pub log_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            debug: false,
            json: false,
            log_dir: None,
            log_prefix: default_log_prefix(),
        }
    }
}

fn default_log_prefix() -> String {
    "modtools".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_settings_defaults() {
        let settings = ToolSettings::default();
        assert!(settings.create_solution);
        assert!(!settings.import_new_files);
        assert!(!settings.logging.debug);
        assert_eq!(settings.logging.log_dir, None);
        assert_eq!(settings.logging.log_prefix, "modtools");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let settings: ToolSettings = serde_yaml_ng::from_str("create_solution: false\n").unwrap();
        assert!(!settings.create_solution);
        assert_eq!(settings.logging, LoggingSettings::default());
    }
}

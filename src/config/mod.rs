use crate::models::ToolSettings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

pub const SETTINGS_FILE: &str = "modtools.yaml";

/// Prefix for environment overrides, e.g. `MODTOOLS_LOGGING__DEBUG=true`.
pub const ENV_PREFIX: &str = "MODTOOLS";

/// Loads and saves [`ToolSettings`].
///
/// Settings are layered: built-in defaults, then `modtools.yaml` in the
/// config directory (if present), then `MODTOOLS_*` environment variables.
/// Nested keys use a double underscore separator.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Manager for settings under `config_dir`; nothing is read or created yet.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            config_dir,
        }
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Full path of the YAML settings file.
    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }

    /// Load settings from all layers.
    ///
    /// A missing settings file is not an error; a malformed one is.
    pub fn load_settings(&self) -> Result<ToolSettings> {
        if !self.settings_path.exists() {
            tracing::debug!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let defaults = config::Config::try_from(&ToolSettings::default())
            .context("Failed to build default settings")?;

        let layered = config::Config::builder()
            .add_source(defaults)
            .add_source(
                config::File::from(self.settings_path.as_std_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: ToolSettings = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Write settings as YAML, creating the config directory if needed.
    pub fn save_settings(&self, settings: &ToolSettings) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).with_context(|| {
                format!("Failed to create config directory: {}", self.config_dir)
            })?;
        }

        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }
}

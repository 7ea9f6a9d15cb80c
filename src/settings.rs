//! Hub settings and their loading from files and environment variables.

use serde::Deserialize;

#[cfg(feature = "settings")]
use crate::error::{HubError, Result};
#[cfg(feature = "settings")]
use std::path::PathBuf;

/// Tunables for a [`Hub`](crate::Hub).
///
/// Deserializable so it can be embedded in a host application's own
/// configuration, or loaded on its own with [`SettingsLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    /// Name recorded on every log event and metric emitted by the hub.
    pub name: String,
    /// Log the fan-out of every publish call at `DEBUG` level.
    pub trace_dispatch: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            name: "hub".to_string(),
            trace_dispatch: false,
        }
    }
}

#[cfg(feature = "settings")]
impl HubSettings {
    /// Create a loader for settings.
    pub fn loader() -> SettingsLoader {
        SettingsLoader::new()
    }
}

/// Loads [`HubSettings`] from an optional file and environment overrides.
///
/// Files may be YAML, TOML or JSON, detected from the extension. Environment
/// variables take precedence over the file.
///
/// # Examples
///
/// ```rust,no_run
/// use pubsub_hub::prelude::*;
///
/// # fn example() -> Result<()> {
/// // HUB_NAME=orders HUB_TRACE_DISPATCH=true
/// let settings = HubSettings::loader()
///     .with_file("config/hub.yaml")
///     .with_env_overrides("HUB", "__")
///     .load()?;
///
/// let hub = Hub::builder().with_settings(settings).build();
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "settings")]
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
}

#[cfg(feature = "settings")]
impl SettingsLoader {
    /// Create a loader with no sources; loading it yields the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read settings from a file. The file must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Override settings from environment variables with the given prefix.
    ///
    /// The prefix is always followed by a single `_`, as in `HUB_NAME`.
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "HUB")
    /// * `separator` - Separator for nested keys (e.g., "__")
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Merge all sources and deserialize the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, has an unsupported extension,
    /// or any value fails to deserialize.
    pub fn load(self) -> Result<HubSettings> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml" | "toml" | "json") => {}
                other => {
                    return Err(HubError::Settings(format!(
                        "Unsupported settings file extension: {}. Supported: .yaml, .yml, .toml, .json",
                        other.unwrap_or("<none>")
                    )));
                }
            }
            if !path.exists() {
                return Err(HubError::Settings(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path.clone()).required(true));
        }

        if let (Some(prefix), Some(separator)) = (&self.env_prefix, &self.env_separator) {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator(separator)
                    .try_parsing(true),
            );
        }

        let merged = builder
            .build()
            .map_err(|e| HubError::Settings(format!("Failed to read settings: {}", e)))?;

        merged
            .try_deserialize::<HubSettings>()
            .map_err(|e| HubError::Settings(format!("Failed to deserialize settings: {}", e)))
    }
}

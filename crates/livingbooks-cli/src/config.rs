//! Storybook manifest and environment settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use livingbooks_content::domain::templates::{TemplateBinding, TemplateTable};
use livingbooks_core::config::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;

const MANIFEST_VAR: &str = "LIVINGBOOKS_MANIFEST";
const TICK_VAR: &str = "LIVINGBOOKS_TICK_MS";
const ALLOW_LIMITED_VAR: &str = "LIVINGBOOKS_ALLOW_LIMITED_TRACKING";
const SETTLE_DELAY_VAR: &str = "LIVINGBOOKS_SETTLE_DELAY_SECONDS";
const SUPPRESSION_VAR: &str = "LIVINGBOOKS_SUPPRESSION_WINDOW_SECONDS";
const DEFAULT_TICK_MS: u64 = 100;

/// A storybook: coordinator settings plus the marker → template table.
///
/// ```yaml
/// coordinator:
///   settle_delay_seconds: 1.5
/// bindings:
///   - marker: fox
///     template: scenes/fox
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorybookManifest {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub bindings: Vec<TemplateBinding>,
}

impl StorybookManifest {
    /// Parses a manifest from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Manifest` if the text is not a valid manifest.
    pub fn from_yaml(text: &str) -> Result<Self, AppError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be read and
    /// `AppError::Manifest` if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        let manifest = Self::from_yaml(&text)?;
        info!(
            path = %path.display(),
            bindings = manifest.bindings.len(),
            "storybook manifest loaded"
        );
        Ok(manifest)
    }

    /// Builds the template table from the manifest's bindings.
    #[must_use]
    pub fn template_table(&self) -> TemplateTable {
        TemplateTable::from_bindings(self.bindings.iter().cloned())
    }
}

/// Process settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub manifest_path: PathBuf,
    pub tick: Duration,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the manifest path is missing or the tick
    /// is not a positive integer.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let manifest_path = lookup(MANIFEST_VAR)
            .ok_or_else(|| AppError::Config(format!("{MANIFEST_VAR} must be set")))?;
        let tick_ms: u64 = match lookup(TICK_VAR) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| AppError::Config(format!("{TICK_VAR} must be a valid u64: {e}")))?,
            None => DEFAULT_TICK_MS,
        };
        if tick_ms == 0 {
            return Err(AppError::Config(format!("{TICK_VAR} must be positive")));
        }
        Ok(Self {
            manifest_path: PathBuf::from(manifest_path),
            tick: Duration::from_millis(tick_ms),
        })
    }
}

/// Applies the `LIVINGBOOKS_*` coordinator overrides found through `lookup`
/// on top of `config`, then validates the result.
///
/// # Errors
///
/// Returns `AppError::Config` for unparsable values and `AppError::Domain`
/// if the resulting configuration is invalid.
pub fn apply_overrides(
    mut config: CoordinatorConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<CoordinatorConfig, AppError> {
    if let Some(raw) = lookup(ALLOW_LIMITED_VAR) {
        config.allow_limited_tracking = raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{ALLOW_LIMITED_VAR} must be true or false: {e}")))?;
    }
    if let Some(raw) = lookup(SETTLE_DELAY_VAR) {
        config.settle_delay_seconds = parse_seconds(SETTLE_DELAY_VAR, &raw)?;
    }
    if let Some(raw) = lookup(SUPPRESSION_VAR) {
        config.suppression_window_seconds = parse_seconds(SUPPRESSION_VAR, &raw)?;
    }
    config.validate()?;
    Ok(config)
}

fn parse_seconds(key: &str, raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key} must be a number of seconds: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use livingbooks_core::content::TemplateResolver;
    use livingbooks_core::error::DomainError;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_manifest_parses_coordinator_and_bindings() {
        let yaml = r"
coordinator:
  allow_limited_tracking: true
  settle_delay_seconds: 2.0
bindings:
  - marker: fox
    template: scenes/fox
  - marker: owl
    template: scenes/owl
";

        let manifest = StorybookManifest::from_yaml(yaml).unwrap();

        assert!(manifest.coordinator.allow_limited_tracking);
        assert!((manifest.coordinator.settle_delay_seconds - 2.0).abs() < f64::EPSILON);
        assert!((manifest.coordinator.suppression_window_seconds - 1.5).abs() < f64::EPSILON);
        assert_eq!(manifest.bindings.len(), 2);
        let table = manifest.template_table();
        assert_eq!(table.resolve("owl").unwrap().as_str(), "scenes/owl");
    }

    #[test]
    fn test_manifest_without_coordinator_section_uses_defaults() {
        let manifest = StorybookManifest::from_yaml("bindings: []").unwrap();

        assert_eq!(manifest.coordinator, CoordinatorConfig::default());
        assert!(manifest.bindings.is_empty());
    }

    #[test]
    fn test_malformed_manifest_is_rejected() {
        let result = StorybookManifest::from_yaml("bindings: 42");

        assert!(matches!(result, Err(AppError::Manifest(_))));
    }

    #[test]
    fn test_missing_manifest_file_is_io_error() {
        let result = StorybookManifest::load(Path::new("/nonexistent/storybook.yaml"));

        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_settings_require_manifest_path() {
        let result = Settings::from_lookup(env(&[]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_settings_default_tick() {
        let settings = Settings::from_lookup(env(&[(MANIFEST_VAR, "book.yaml")])).unwrap();

        assert_eq!(settings.manifest_path, PathBuf::from("book.yaml"));
        assert_eq!(settings.tick, Duration::from_millis(100));
    }

    #[test]
    fn test_settings_reject_zero_tick() {
        let result = Settings::from_lookup(env(&[(MANIFEST_VAR, "book.yaml"), (TICK_VAR, "0")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_overrides_replace_manifest_values() {
        let config = apply_overrides(
            CoordinatorConfig::default(),
            env(&[
                (ALLOW_LIMITED_VAR, "true"),
                (SETTLE_DELAY_VAR, "0.5"),
                (SUPPRESSION_VAR, "3"),
            ]),
        )
        .unwrap();

        assert!(config.allow_limited_tracking);
        assert!((config.settle_delay_seconds - 0.5).abs() < f64::EPSILON);
        assert!((config.suppression_window_seconds - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overrides_reject_unparsable_values() {
        let result = apply_overrides(CoordinatorConfig::default(), env(&[(SETTLE_DELAY_VAR, "soon")]));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_overrides_reject_negative_durations() {
        let result = apply_overrides(CoordinatorConfig::default(), env(&[(SUPPRESSION_VAR, "-1")]));

        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::Configuration(_)))
        ));
    }
}

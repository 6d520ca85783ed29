//! Runtime configuration loading (`runtime.toml`).

#![allow(missing_docs)]

use std::path::Path;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::image::ProcessImage;
use crate::runtime::Simulation;
use crate::scheduler::DEFAULT_SCAN_PERIOD;
use crate::validate::ValidationOptions;
use crate::value::Duration;

/// Signals of the robot-arm cell, registered before any program loads.
pub const ROBOT_TAGS: [&str; 16] = [
    "M1_F", "M1_B", "FC1_F", "FC1_B", "M2_F", "M2_B", "FC2_F", "FC2_B", "M3_F", "M3_B", "FC3_F",
    "FC3_B", "M4_F", "M4_B", "FC4_F", "FC4_B",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub resource_name: SmolStr,
    pub cycle_interval: Duration,
    pub log_level: SmolStr,
    pub preset_tags: Vec<SmolStr>,
    pub validation: ValidationOptions,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            resource_name: SmolStr::new("ladder"),
            cycle_interval: DEFAULT_SCAN_PERIOD,
            log_level: SmolStr::new("info"),
            preset_tags: ROBOT_TAGS.iter().copied().map(SmolStr::new).collect(),
            validation: ValidationOptions::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|err| RuntimeError::InvalidConfig(format!("runtime.toml: {err}").into()))?;
        Self::from_toml_str(&text)
    }

    /// Load `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let path = path.as_ref();
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, RuntimeError> {
        let raw: RuntimeToml = toml::from_str(text)
            .map_err(|err| RuntimeError::InvalidConfig(format!("runtime.toml: {err}").into()))?;
        raw.into_config()
    }

    /// Fresh process image with the preset tags registered.
    #[must_use]
    pub fn initial_image(&self) -> ProcessImage {
        ProcessImage::with_tags(self.preset_tags.iter().map(SmolStr::as_str))
    }

    #[must_use]
    pub fn simulation(&self) -> Simulation {
        Simulation::new(self.initial_image()).with_validation(self.validation)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuntimeToml {
    resource: Option<ResourceSection>,
    log: Option<LogSection>,
    image: Option<ImageSection>,
    validation: Option<ValidationSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceSection {
    name: Option<String>,
    cycle_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSection {
    level: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageSection {
    preset_tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValidationSection {
    allow_multiple_drivers: Option<bool>,
}

impl RuntimeToml {
    fn into_config(self) -> Result<RuntimeConfig, RuntimeError> {
        let mut config = RuntimeConfig::default();
        if let Some(resource) = self.resource {
            if let Some(name) = resource.name {
                if name.trim().is_empty() {
                    return Err(RuntimeError::InvalidConfig(
                        "resource.name must not be empty".into(),
                    ));
                }
                config.resource_name = SmolStr::new(name.trim());
            }
            if let Some(interval_ms) = resource.cycle_interval_ms {
                if interval_ms == 0 {
                    return Err(RuntimeError::InvalidConfig(
                        "resource.cycle_interval_ms must be greater than 0".into(),
                    ));
                }
                let interval_ms = i64::try_from(interval_ms).map_err(|_| {
                    RuntimeError::InvalidConfig(
                        format!("resource.cycle_interval_ms {interval_ms} out of range").into(),
                    )
                })?;
                config.cycle_interval = Duration::from_millis(interval_ms);
            }
        }
        if let Some(log) = self.log {
            let level = log.level.trim().to_ascii_lowercase();
            if !matches!(
                level.as_str(),
                "trace" | "debug" | "info" | "warn" | "error" | "off"
            ) {
                return Err(RuntimeError::InvalidConfig(
                    format!("invalid log.level '{}'", log.level).into(),
                ));
            }
            config.log_level = SmolStr::new(level);
        }
        if let Some(image) = self.image {
            let mut tags = Vec::with_capacity(image.preset_tags.len());
            for tag in image.preset_tags {
                let Some(tag) = crate::tag::normalize_tag(&tag) else {
                    return Err(RuntimeError::InvalidConfig(
                        "image.preset_tags must not contain empty tags".into(),
                    ));
                };
                tags.push(tag);
            }
            config.preset_tags = tags;
        }
        if let Some(validation) = self.validation {
            config.validation.allow_multiple_drivers =
                validation.allow_multiple_drivers.unwrap_or(false);
        }
        Ok(config)
    }
}

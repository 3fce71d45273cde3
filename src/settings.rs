use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{components::OutputSampleType, crop::CropOptions};

/// Environment variable naming the directory of served images.
pub const IMAGE_DIR_VAR: &str = "IMG_PATH";
pub const OUTPUT_SAMPLE_TYPE_VAR: &str = "OUTPUT_SAMPLE_TYPE";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Environment variable {0} is not set")]
    MissingVariable(&'static str),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Runtime configuration of the crop service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding `<image>.tif` rasters
    #[serde(alias = "IMG_PATH")]
    pub image_dir: PathBuf,

    /// Sample type of returned rasters
    #[serde(default)]
    pub output_sample_type: OutputSampleType,
}

impl Settings {
    pub fn new<P: Into<PathBuf>>(image_dir: P) -> Self {
        Self {
            image_dir: image_dir.into(),
            output_sample_type: OutputSampleType::default(),
        }
    }

    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings from variables resolved by `lookup`.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, SettingsError> {
        let image_dir = lookup(IMAGE_DIR_VAR).ok_or(SettingsError::MissingVariable(IMAGE_DIR_VAR))?;
        let output_sample_type = match lookup(OUTPUT_SAMPLE_TYPE_VAR) {
            Some(value) => serde_json::from_value(serde_json::Value::String(value.clone()))
                .map_err(|_| SettingsError::InvalidValue {
                    name: OUTPUT_SAMPLE_TYPE_VAR,
                    value,
                })?,
            None => OutputSampleType::default(),
        };
        Ok(Self {
            image_dir: PathBuf::from(image_dir),
            output_sample_type,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn crop_options(&self) -> CropOptions {
        CropOptions {
            output_sample_type: self.output_sample_type,
        }
    }

    /// Path of the raster served as `image`.
    pub fn image_path(&self, image: &str) -> PathBuf {
        self.image_dir.join(format!("{image}.tif"))
    }
}

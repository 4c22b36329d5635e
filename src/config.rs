//! TOML configuration for the command-line tool.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::book::WritingDirection;
use crate::epub::{EpubConfig, TemplateAssets};
use crate::error::Result;

/// Settings read from a config file. Every field is optional.
///
/// ```toml
/// template_dir = "template"
/// compression_level = 6
/// toc_title = "Contents"
/// language = "en"
/// direction = "horizontal"
/// ```
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding `mimetype`, `META-INF/container.xml` and `OPS/css/*.css`.
    pub template_dir: Option<PathBuf>,
    pub compression_level: Option<u32>,
    pub toc_title: Option<String>,
    pub language: Option<String>,
    pub direction: Option<WritingDirection>,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn epub_config(&self) -> EpubConfig {
        let mut config = EpubConfig {
            compression_level: self.compression_level,
            ..EpubConfig::default()
        };
        if let Some(title) = &self.toc_title {
            config.toc_title = title.clone();
        }
        config
    }

    /// Fixed assets from `template_dir`, or the built-in set.
    pub fn assets(&self) -> Result<TemplateAssets> {
        match &self.template_dir {
            Some(dir) => TemplateAssets::from_dir(dir),
            None => Ok(TemplateAssets::builtin()),
        }
    }
}

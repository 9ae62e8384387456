use std::path::PathBuf;

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct EditorConfig {
    pub data: DataSection,
    pub render: RenderSection,
    pub log: LogSection,
}

impl EditorConfig {
    // https://github.com/mehcode/config-rs/blob/master/examples/hierarchical-env/settings.rs
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config.template.toml"))
            .add_source(File::with_name("config.toml").required(false))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(content, config::FileFormat::Toml))
            .build()?;

        s.try_deserialize()
    }
}

#[derive(Debug, Deserialize)]
pub struct DataSection {
    pub client_directory: String,
    pub locale: String,
    pub disk_search_path: String,
    pub archives: Vec<String>, // Highest priority first, {locale} is replaced
}

impl DataSection {
    pub fn archive_paths(&self) -> Vec<PathBuf> {
        self.archives
            .iter()
            .map(|archive| {
                let mut full_path = PathBuf::from(&self.client_directory);
                full_path.push(archive.replace("{locale}", &self.locale));
                full_path
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderSection {
    pub view_distance: f32,
    pub fog_distance: f32,
    pub draw_doodads: bool,
    pub draw_fog: bool,
}

#[derive(Debug, Deserialize)]
pub struct LogSection {
    pub level: String,
}

use crate::dataset::writer::TextColumns;
use crate::error::Result;
use crate::source::Layout;
use serde_derive::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Config {
    #[serde(default)]
    build: BuildConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn into_build(self) -> BuildConfig {
        self.build
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    pub data_dir: PathBuf,
    pub dataset_dir: PathBuf,
    pub min_count: usize,
    pub volume_unit: usize,
    pub layout: Layout,
    pub text_columns: TextColumns,
    pub utc_offset_hours: i32,
    pub limit: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            data_dir: PathBuf::from("../scraped/users"),
            dataset_dir: PathBuf::from("../dataset"),
            min_count: 20,
            volume_unit: 1_000_000,
            layout: Layout::Users,
            text_columns: TextColumns::Votes,
            utc_offset_hours: 9,
            limit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_build_config() {
        let input = "[build]\ndataDir=\"raw/comments\"\nminCount=5\nlayout=\"movies\"\nutcOffsetHours=0";

        let config = toml::from_str::<Config>(&input).unwrap();
        let expected = Config {
            build: BuildConfig {
                data_dir: PathBuf::from("raw/comments"),
                min_count: 5,
                layout: Layout::Movies,
                utc_offset_hours: 0,
                ..BuildConfig::default()
            },
        };

        assert_eq!(config, expected);
    }

    #[test]
    fn parse_empty_config() {
        let config = toml::from_str::<Config>("").unwrap();

        assert_eq!(config.into_build(), BuildConfig::default());
    }

    #[test]
    fn reject_unknown_layout() {
        assert!(toml::from_str::<Config>("[build]\nlayout=\"genres\"").is_err());
    }
}

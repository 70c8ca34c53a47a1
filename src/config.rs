use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::info;

use crate::{
    error::{CardError, Result},
    fonts::BUNDLED_FAMILIES,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fonts: FontsCfg,
    pub images: ImagesCfg,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FontsCfg {
    /// Families registered before any card is drawn.
    pub families: Vec<String>,
    /// Font files registered under a family name, before the system families.
    pub files: Vec<FontFileCfg>,
}

impl Default for FontsCfg {
    fn default() -> Self {
        Self {
            families: BUNDLED_FAMILIES.iter().map(|&f| f.to_owned()).collect(),
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FontFileCfg {
    pub path: PathBuf,
    pub family: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImagesCfg {
    /// Image drawn in place of any avatar or background that cannot be loaded.
    pub fallback: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ImagesCfg {
    fn default() -> Self {
        Self {
            fallback: None,
            timeout_secs: 10,
        }
    }
}

impl ImagesCfg {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Reads the TOML file at `path`; a missing file gives the default configuration.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            info!("No {} found. Using default configuration.", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| CardError::ConfigIo {
            path: path.to_owned(),
            source,
        })?;
        let config = toml::from_str(&content)?;
        info!("{} successfully loaded.", path.display());
        Ok(config)
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.fonts.families, BUNDLED_FAMILIES);
    assert_eq!(config.images.timeout(), Duration::from_secs(10));
    assert!(config.images.fallback.is_none());
}

#[test]
fn test_partial_config() {
    let config: Config = toml::from_str(
        r#"
        [images]
        fallback = "assets/images/fallback.png"
        "#,
    )
    .unwrap();
    assert_eq!(
        config.images.fallback.as_deref(),
        Some(Path::new("assets/images/fallback.png"))
    );
    assert_eq!(config.images.timeout_secs, 10);
    assert_eq!(config.fonts.families.len(), BUNDLED_FAMILIES.len());
    assert!(config.fonts.files.is_empty());
}

#[test]
fn test_font_files_config() {
    let config: Config = toml::from_str(
        r#"
        [fonts]
        families = ["Nirmala UI"]

        [[fonts.files]]
        path = "assets/fonts/Fredoka-Bold.ttf"
        family = "Fredoka Bold"

        [[fonts.files]]
        path = "assets/fonts/Poppins-Bold.ttf"
        family = "Poppins Bold"
        "#,
    )
    .unwrap();
    assert_eq!(config.fonts.families, ["Nirmala UI"]);
    assert_eq!(config.fonts.files.len(), 2);
    assert_eq!(
        config.fonts.files[0],
        FontFileCfg {
            path: PathBuf::from("assets/fonts/Fredoka-Bold.ttf"),
            family: "Fredoka Bold".to_owned(),
        }
    );
}

#[test]
fn test_missing_file_gives_defaults() {
    let config = Config::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(config.images.timeout_secs, 10);
}

#[test]
fn test_invalid_config_is_an_error() {
    let path = std::env::temp_dir().join("cardgen-invalid-config.toml");
    std::fs::write(&path, "[images]\ntimeout_secs = \"ten\"\n").unwrap();
    assert!(matches!(
        Config::load(&path),
        Err(CardError::ConfigParse(_))
    ));
}

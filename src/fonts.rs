use std::{collections::HashMap, path::Path};

use piet_common::{FontFamily, Text};
use tracing::{info, instrument, warn};

use crate::{
    config::FontsCfg,
    error::{CardError, Result},
};

pub const NIRMALA_UI: &str = "Nirmala UI";
pub const FREDOKA_BOLD: &str = "Fredoka Bold";
pub const POPPINS_BOLD: &str = "Poppins Bold";

/// Families the default card models refer to.
pub const BUNDLED_FAMILIES: [&str; 3] = [NIRMALA_UI, FREDOKA_BOLD, POPPINS_BOLD];

/// Font families a card may be drawn with, by name.
///
/// Filled once before rendering; renders only read it.
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    families: HashMap<String, FontFamily>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every family in `names`, mapping the ones missing on this system onto
    /// the generic sans-serif family.
    #[instrument(skip(text))]
    pub fn with_families<T: Text>(text: &mut T, names: &[&str]) -> Self {
        let mut registry = Self::new();
        for name in names {
            registry.register_or_alias(text, name);
        }
        registry
    }

    /// Registers the font files of `cfg`, then its system families.
    ///
    /// A file the backend cannot load is looked up among the system fonts by its family
    /// name, and ends up as sans-serif when missing there too.
    #[instrument(skip_all)]
    pub fn from_config<T: Text>(text: &mut T, cfg: &FontsCfg) -> Self {
        let mut registry = Self::new();
        for file in &cfg.files {
            if let Err(e) = registry.register_path(text, &file.path, &file.family) {
                warn!("{e}");
            }
        }

        let names = cfg
            .files
            .iter()
            .map(|file| &file.family)
            .chain(&cfg.families);
        for name in names {
            if !registry.contains(name) {
                registry.register_or_alias(text, name);
            }
        }
        registry
    }

    /// Registry of the families used by the default card models.
    pub fn bundled<T: Text>(text: &mut T) -> Self {
        Self::with_families(text, &BUNDLED_FAMILIES)
    }

    /// Looks `name` up in the system fonts and registers it.
    pub fn register<T: Text>(&mut self, text: &mut T, name: &str) -> Result<()> {
        let family = text
            .font_family(name)
            .ok_or_else(|| CardError::FontUnavailable(name.to_owned()))?;
        info!("Registered font family {name:?}");
        self.families.insert(name.to_owned(), family);
        Ok(())
    }

    /// Loads a font file and registers it under `name`.
    pub fn register_file<T: Text>(&mut self, text: &mut T, data: &[u8], name: &str) -> Result<()> {
        let family = text.load_font(data)?;
        info!("Registered font file as {name:?} ({})", family.name());
        self.families.insert(name.to_owned(), family);
        Ok(())
    }

    /// Reads the font file at `path` and registers it under `name`.
    pub fn register_path<T: Text>(&mut self, text: &mut T, path: &Path, name: &str) -> Result<()> {
        let data = std::fs::read(path).map_err(|source| CardError::FontIo {
            path: path.to_owned(),
            source,
        })?;
        self.register_file(text, &data, name)
    }

    fn register_or_alias<T: Text>(&mut self, text: &mut T, name: &str) {
        if let Err(e) = self.register(text, name) {
            warn!("{e}, falling back to sans-serif");
            self.register_as(name, FontFamily::SANS_SERIF);
        }
    }

    /// Makes `name` refer to an already available family.
    pub fn register_as(&mut self, name: &str, family: FontFamily) {
        self.families.insert(name.to_owned(), family);
    }

    pub fn get(&self, name: &str) -> Result<FontFamily> {
        self.families
            .get(name)
            .cloned()
            .ok_or_else(|| CardError::FontNotRegistered(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }
}

#[test]
fn test_unregistered_family_fails() {
    let registry = FontRegistry::new();
    assert!(matches!(
        registry.get(FREDOKA_BOLD),
        Err(CardError::FontNotRegistered(name)) if name == FREDOKA_BOLD
    ));
}

#[test]
fn test_register_as_alias() {
    let mut registry = FontRegistry::new();
    registry.register_as(POPPINS_BOLD, FontFamily::SERIF);
    assert_eq!(registry.get(POPPINS_BOLD).unwrap(), FontFamily::SERIF);
}

#[test]
fn test_bundled_registers_every_default_family() {
    let mut text = piet_common::PietText::new();
    let registry = FontRegistry::bundled(&mut text);
    for name in BUNDLED_FAMILIES {
        assert!(registry.contains(name), "{name} missing");
    }
}

#[cfg(test)]
const TEST_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/Anaheim-Bold.ttf");

#[test]
fn test_register_file_leaves_no_entry_on_failure() {
    let mut text = piet_common::PietText::new();
    let mut registry = FontRegistry::new();
    let data = std::fs::read(TEST_FONT).unwrap();

    // Not every backend loads raw font data; a refused file registers nothing.
    match registry.register_file(&mut text, &data, "Anaheim Bold") {
        Ok(()) => assert!(registry.get("Anaheim Bold").is_ok()),
        Err(e) => {
            assert!(matches!(e, CardError::Render(_)));
            assert!(!registry.contains("Anaheim Bold"));
        }
    }
}

#[test]
fn test_missing_font_file() {
    let mut registry = FontRegistry::new();
    let err = registry
        .register_path(
            &mut piet_common::PietText::new(),
            Path::new("assets/fonts/missing.ttf"),
            "Missing",
        )
        .unwrap_err();
    assert!(matches!(err, CardError::FontIo { .. }));
    assert!(!registry.contains("Missing"));
}

#[test]
fn test_config_font_files_are_resolvable() {
    let cfg = FontsCfg {
        families: vec![NIRMALA_UI.to_owned()],
        files: vec![
            crate::config::FontFileCfg {
                path: TEST_FONT.into(),
                family: "Anaheim Bold".to_owned(),
            },
            crate::config::FontFileCfg {
                path: "assets/fonts/missing.ttf".into(),
                family: FREDOKA_BOLD.to_owned(),
            },
        ],
    };
    let registry = FontRegistry::from_config(&mut piet_common::PietText::new(), &cfg);

    assert!(registry.get("Anaheim Bold").is_ok());
    assert!(registry.get(FREDOKA_BOLD).is_ok());
    assert!(registry.get(NIRMALA_UI).is_ok());
    assert!(registry.get(POPPINS_BOLD).is_err());
}

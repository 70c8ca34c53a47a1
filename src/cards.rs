//! Card descriptions: builders collecting user values and the validated models they
//! produce.

pub mod member;
pub mod rank;

use piet_common::Color;
use serde::Deserialize;

use crate::error::{CardError, Result};

pub(crate) const DEFAULT_AVATAR: &str =
    "https://i.pinimg.com/736x/c6/a8/5f/c6a85f7dbcbf367d5dc1baa2aaa19a73.jpg";
pub(crate) const DEFAULT_BACKGROUND: &str = "https://img.freepik.com/foto-gratis/fondo-azul-degradado-lujo-abstracto-azul-oscuro-liso-banner-estudio-vineta-negra_1258-52379.jpg";
pub(crate) const WHITE: &str = "#ffffff";

/// Where the avatar and the background come from: URLs or file paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImageRefs {
    pub avatar: String,
    pub background: String,
}

impl Default for ImageRefs {
    fn default() -> Self {
        Self {
            avatar: DEFAULT_AVATAR.to_owned(),
            background: DEFAULT_BACKGROUND.to_owned(),
        }
    }
}

impl ImageRefs {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.avatar.trim().is_empty() {
            return Err(CardError::EmptyImageReference("avatar"));
        }
        if self.background.trim().is_empty() {
            return Err(CardError::EmptyImageReference("background"));
        }
        Ok(())
    }
}

/// Parses a `#rgb`, `#rrggbb` or `#rrggbbaa` color.
pub(crate) fn parse_color(field: &'static str, value: &str) -> Result<Color> {
    Color::from_hex_str(value.trim()).map_err(|_| CardError::invalid_color(field, value))
}

pub(crate) fn check_font(field: &'static str, family: &str) -> Result<String> {
    let family = family.trim();
    if family.is_empty() {
        return Err(CardError::EmptyFontFamily(field));
    }
    Ok(family.to_owned())
}

pub(crate) fn check_radius(radius: f64) -> Result<f64> {
    if radius.is_finite() && radius >= 0. {
        Ok(radius)
    } else {
        Err(CardError::InvalidRadius(radius))
    }
}

#[test]
fn test_parse_color() {
    assert_eq!(
        parse_color("username", "#ff0000").unwrap(),
        Color::rgba8(0xff, 0, 0, 0xff)
    );
    assert_eq!(
        parse_color("username", "#0d0d0d80").unwrap(),
        Color::rgba8(0x0d, 0x0d, 0x0d, 0x80)
    );
    assert!(matches!(
        parse_color("rank", "blurple"),
        Err(CardError::InvalidColor { field: "rank", .. })
    ));
}

#[test]
fn test_empty_references_are_rejected() {
    let refs = ImageRefs {
        avatar: " ".to_owned(),
        ..Default::default()
    };
    assert!(matches!(
        refs.validate(),
        Err(CardError::EmptyImageReference("avatar"))
    ));
}

#[test]
fn test_radius_must_be_positive() {
    assert!(check_radius(25.).is_ok());
    assert!(check_radius(-1.).is_err());
    assert!(check_radius(f64::NAN).is_err());
}

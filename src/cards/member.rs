use piet_common::Color;
use serde::Deserialize;
use tracing::{info, instrument};

use super::{check_font, check_radius, parse_color, ImageRefs, WHITE};
use crate::{
    draw::{member_card, BOX_BLACK},
    error::Result,
    fonts::{NIRMALA_UI, POPPINS_BOLD},
    images::{CardImages, ImageResolver},
    FontRegistry,
};

/// Text elements of the member card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberText {
    Username,
    Title,
    Description,
    MemberCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemberColorSpec {
    pub title: String,
    pub description: String,
    pub username: String,
    pub stroke: String,
    #[serde(rename = "box")]
    pub box_color: String,
    pub member_count: String,
}

impl Default for MemberColorSpec {
    fn default() -> Self {
        let (r, g, b, _) = BOX_BLACK.as_rgba8();
        Self {
            title: WHITE.to_owned(),
            description: WHITE.to_owned(),
            username: WHITE.to_owned(),
            stroke: WHITE.to_owned(),
            box_color: format!("#{r:02x}{g:02x}{b:02x}"),
            member_count: WHITE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemberFontSpec {
    pub username: String,
    pub title: String,
    pub description: String,
    pub member_count: String,
}

impl Default for MemberFontSpec {
    fn default() -> Self {
        Self {
            username: NIRMALA_UI.to_owned(),
            title: POPPINS_BOLD.to_owned(),
            description: POPPINS_BOLD.to_owned(),
            member_count: POPPINS_BOLD.to_owned(),
        }
    }
}

/// Collects the values of a member card. Nothing is checked until
/// [`MemberCardBuilder::build`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemberCardBuilder {
    pub username: String,
    pub title: String,
    pub description: String,
    pub member_count: u64,
    pub colors: MemberColorSpec,
    pub fonts: MemberFontSpec,
    pub images: ImageRefs,
    pub radius: f64,
    #[serde(alias = "box")]
    pub show_box: bool,
}

impl Default for MemberCardBuilder {
    fn default() -> Self {
        Self {
            username: "Unknown#0000".to_owned(),
            title: "WELCOME".to_owned(),
            description: "A new user".to_owned(),
            member_count: 150,
            colors: MemberColorSpec::default(),
            fonts: MemberFontSpec::default(),
            images: ImageRefs::default(),
            radius: 15.,
            show_box: true,
        }
    }
}

impl MemberCardBuilder {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn member_count(mut self, count: u64) -> Self {
        self.member_count = count;
        self
    }

    pub fn color(mut self, element: MemberText, color: impl Into<String>) -> Self {
        let color = color.into();
        match element {
            MemberText::Username => self.colors.username = color,
            MemberText::Title => self.colors.title = color,
            MemberText::Description => self.colors.description = color,
            MemberText::MemberCount => self.colors.member_count = color,
        }
        self
    }

    pub fn font(mut self, element: MemberText, family: impl Into<String>) -> Self {
        let family = family.into();
        match element {
            MemberText::Username => self.fonts.username = family,
            MemberText::Title => self.fonts.title = family,
            MemberText::Description => self.fonts.description = family,
            MemberText::MemberCount => self.fonts.member_count = family,
        }
        self
    }

    /// Avatar reference and the color of its frame.
    pub fn avatar(mut self, reference: impl Into<String>, stroke: Option<&str>) -> Self {
        self.images.avatar = reference.into();
        if let Some(stroke) = stroke {
            self.colors.stroke = stroke.to_owned();
        }
        self
    }

    pub fn background(mut self, reference: impl Into<String>) -> Self {
        self.images.background = reference.into();
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Shows or hides the translucent box behind the card content.
    pub fn show_box(mut self, show: bool, color: Option<&str>) -> Self {
        self.show_box = show;
        if let Some(color) = color {
            self.colors.box_color = color.to_owned();
        }
        self
    }

    /// Checks every value and freezes the card.
    #[instrument(skip_all)]
    pub fn build(self) -> Result<MemberCard> {
        let colors = MemberColors {
            title: parse_color("title", &self.colors.title)?,
            description: parse_color("description", &self.colors.description)?,
            username: parse_color("username", &self.colors.username)?,
            stroke: parse_color("stroke", &self.colors.stroke)?,
            box_color: parse_color("box", &self.colors.box_color)?,
            member_count: parse_color("member_count", &self.colors.member_count)?,
        };
        let fonts = MemberFonts {
            username: check_font("username", &self.fonts.username)?,
            title: check_font("title", &self.fonts.title)?,
            description: check_font("description", &self.fonts.description)?,
            member_count: check_font("member_count", &self.fonts.member_count)?,
        };
        self.images.validate()?;
        let radius = check_radius(self.radius)?;

        info!("Member card of {} validated", self.username);
        Ok(MemberCard {
            username: self.username,
            title: self.title,
            description: self.description,
            member_count: self.member_count,
            colors,
            fonts,
            images: self.images,
            radius,
            show_box: self.show_box,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MemberColors {
    pub(crate) title: Color,
    pub(crate) description: Color,
    pub(crate) username: Color,
    pub(crate) stroke: Color,
    pub(crate) box_color: Color,
    pub(crate) member_count: Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MemberFonts {
    pub(crate) username: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) member_count: String,
}

/// A validated member card, drawn on a 1260x620 canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberCard {
    pub(crate) username: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) member_count: u64,
    pub(crate) colors: MemberColors,
    pub(crate) fonts: MemberFonts,
    pub(crate) images: ImageRefs,
    pub(crate) radius: f64,
    pub(crate) show_box: bool,
}

impl MemberCard {
    pub fn builder() -> MemberCardBuilder {
        MemberCardBuilder::default()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Draws the card with already resolved images and returns it PNG encoded.
    pub fn render(&self, images: &CardImages, fonts: &FontRegistry) -> Result<Vec<u8>> {
        member_card::gen_member_card(self, images, fonts)
    }

    /// Resolves the avatar and the background, then draws the card.
    pub async fn render_with(&self, resolver: &ImageResolver, fonts: &FontRegistry) -> Result<Vec<u8>> {
        let images = resolver
            .resolve_card(&self.images.avatar, &self.images.background)
            .await;
        self.render(&images, fonts)
    }
}

#[test]
fn test_default_member_card() {
    let card = MemberCard::builder().build().unwrap();
    assert_eq!(card.username(), "Unknown#0000");
    assert_eq!(card.member_count, 150);
    assert!(card.show_box);
    assert_eq!(card.colors.box_color, Color::rgba8(0x0d, 0x0d, 0x0d, 0xff));
    assert_eq!(card.radius, 15.);
}

#[test]
fn test_invalid_box_color_is_rejected() {
    let err = MemberCard::builder()
        .show_box(true, Some("#12345"))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        crate::CardError::InvalidColor { field: "box", .. }
    ));
}

#[test]
fn test_member_builder_from_json() {
    let builder: MemberCardBuilder = serde_json::from_str(
        r##"{
            "username": "EKXZMANE",
            "member_count": 42,
            "box": false,
            "colors": { "box": "#202225", "title": "#ffcc00" }
        }"##,
    )
    .unwrap();
    let card = builder.build().unwrap();
    assert!(!card.show_box);
    assert_eq!(card.member_count, 42);
    assert_eq!(card.colors.title, Color::rgba8(0xff, 0xcc, 0x00, 0xff));
    assert_eq!(card.colors.description, Color::rgba8(0xff, 0xff, 0xff, 0xff));
}

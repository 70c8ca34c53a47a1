use std::fmt;

use piet_common::Color;
use serde::Deserialize;
use tracing::{info, instrument};

use super::{check_font, check_radius, parse_color, ImageRefs, WHITE};
use crate::{
    draw::{
        bar::{BarColor, BarColorSpec, Stop, StopSpec},
        rank_card,
    },
    error::{CardError, Result},
    fonts::{FREDOKA_BOLD, NIRMALA_UI},
    images::{CardImages, ImageResolver},
    FontRegistry,
};

/// Position of the user in the leaderboard, or any text standing for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Rank {
    Position(u64),
    Label(String),
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(position) => write!(f, "{position}"),
            Self::Label(label) => f.write_str(label),
        }
    }
}

impl From<u64> for Rank {
    fn from(position: u64) -> Self {
        Self::Position(position)
    }
}

impl From<&str> for Rank {
    fn from(label: &str) -> Self {
        Self::Label(label.to_owned())
    }
}

/// Experience inside the current level. `current` never exceeds `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xp {
    current: u64,
    max: u64,
}

impl Xp {
    pub fn new(current: u64, max: u64) -> Result<Self> {
        if current > max {
            return Err(CardError::XpExceedsMax { current, max });
        }
        Ok(Self { current, max })
    }

    pub fn current(self) -> u64 {
        self.current
    }

    pub fn max(self) -> u64 {
        self.max
    }
}

/// Text elements of the rank card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankText {
    Username,
    Nickname,
    Rank,
    Level,
    Xp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct XpSpec {
    pub current: u64,
    pub max: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankColorSpec {
    pub bar: BarColorSpec,
    pub stroke: String,
    pub username: String,
    pub nickname: String,
    pub rank: String,
    pub level: String,
    pub xp: String,
}

impl Default for RankColorSpec {
    fn default() -> Self {
        Self {
            bar: BarColorSpec::Flat(WHITE.to_owned()),
            stroke: WHITE.to_owned(),
            username: WHITE.to_owned(),
            nickname: WHITE.to_owned(),
            rank: WHITE.to_owned(),
            level: WHITE.to_owned(),
            xp: WHITE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RankFontSpec {
    pub username: String,
    pub nickname: String,
    pub rank: String,
    pub level: String,
    pub xp: String,
}

impl Default for RankFontSpec {
    fn default() -> Self {
        Self {
            username: NIRMALA_UI.to_owned(),
            nickname: NIRMALA_UI.to_owned(),
            rank: FREDOKA_BOLD.to_owned(),
            level: FREDOKA_BOLD.to_owned(),
            xp: FREDOKA_BOLD.to_owned(),
        }
    }
}

/// Collects the values of a rank card. Nothing is checked until [`RankCardBuilder::build`].
///
/// ```ignore
/// let card = RankCardBuilder::default()
///     .username("User#0000")
///     .level(4)
///     .xp(75, 380)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RankCardBuilder {
    pub username: String,
    pub nickname: String,
    pub rank: Rank,
    pub level: u64,
    pub xp: XpSpec,
    pub colors: RankColorSpec,
    pub fonts: RankFontSpec,
    pub images: ImageRefs,
    pub radius: f64,
    pub level_text: String,
    pub rank_text: String,
    pub xp_text: String,
}

impl Default for RankCardBuilder {
    fn default() -> Self {
        Self {
            username: "Username#0000".to_owned(),
            nickname: "@developer".to_owned(),
            rank: Rank::Position(1),
            level: 1,
            xp: XpSpec {
                current: 30,
                max: 100,
            },
            colors: RankColorSpec::default(),
            fonts: RankFontSpec::default(),
            images: ImageRefs::default(),
            radius: 25.,
            level_text: "Level {level}".to_owned(),
            rank_text: "#{rank}".to_owned(),
            xp_text: "XP: {current} / {max}".to_owned(),
        }
    }
}

impl RankCardBuilder {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    pub fn rank(mut self, rank: impl Into<Rank>) -> Self {
        self.rank = rank.into();
        self
    }

    pub fn level(mut self, level: u64) -> Self {
        self.level = level;
        self
    }

    pub fn xp(mut self, current: u64, max: u64) -> Self {
        self.xp = XpSpec { current, max };
        self
    }

    pub fn color(mut self, element: RankText, color: impl Into<String>) -> Self {
        let color = color.into();
        match element {
            RankText::Username => self.colors.username = color,
            RankText::Nickname => self.colors.nickname = color,
            RankText::Rank => self.colors.rank = color,
            RankText::Level => self.colors.level = color,
            RankText::Xp => self.colors.xp = color,
        }
        self
    }

    pub fn font(mut self, element: RankText, family: impl Into<String>) -> Self {
        let family = family.into();
        match element {
            RankText::Username => self.fonts.username = family,
            RankText::Nickname => self.fonts.nickname = family,
            RankText::Rank => self.fonts.rank = family,
            RankText::Level => self.fonts.level = family,
            RankText::Xp => self.fonts.xp = family,
        }
        self
    }

    /// Template of the level label, `{level}` is replaced by the level.
    pub fn level_text(mut self, template: impl Into<String>) -> Self {
        self.level_text = template.into();
        self
    }

    /// Template of the rank label, `{rank}` is replaced by the rank.
    pub fn rank_text(mut self, template: impl Into<String>) -> Self {
        self.rank_text = template.into();
        self
    }

    /// Template of the xp label, `{current}` and `{max}` are replaced by the amounts.
    pub fn xp_text(mut self, template: impl Into<String>) -> Self {
        self.xp_text = template.into();
        self
    }

    pub fn bar_color(mut self, color: impl Into<String>) -> Self {
        self.colors.bar = BarColorSpec::Flat(color.into());
        self
    }

    /// Gradient of the progress bar. Stops are expected in ascending position order.
    pub fn bar_gradient<S: Into<String>>(mut self, stops: impl IntoIterator<Item = (S, f32)>) -> Self {
        let stops = stops
            .into_iter()
            .map(|(color, position)| StopSpec {
                color: color.into(),
                position,
            })
            .collect();
        self.colors.bar = BarColorSpec::Gradient(stops);
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

    /// Radius of the card corners.
    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Checks every value and freezes the card.
    #[instrument(skip_all)]
    pub fn build(self) -> Result<RankCard> {
        let xp = Xp::new(self.xp.current, self.xp.max)?;
        let colors = RankColors {
            bar: bar_color(&self.colors.bar)?,
            stroke: parse_color("stroke", &self.colors.stroke)?,
            username: parse_color("username", &self.colors.username)?,
            nickname: parse_color("nickname", &self.colors.nickname)?,
            rank: parse_color("rank", &self.colors.rank)?,
            level: parse_color("level", &self.colors.level)?,
            xp: parse_color("xp", &self.colors.xp)?,
        };
        let fonts = RankFonts {
            username: check_font("username", &self.fonts.username)?,
            nickname: check_font("nickname", &self.fonts.nickname)?,
            rank: check_font("rank", &self.fonts.rank)?,
            level: check_font("level", &self.fonts.level)?,
            xp: check_font("xp", &self.fonts.xp)?,
        };
        self.images.validate()?;
        let radius = check_radius(self.radius)?;

        info!("Rank card of {} validated", self.username);
        Ok(RankCard {
            username: self.username,
            nickname: self.nickname,
            rank: self.rank,
            level: self.level,
            xp,
            colors,
            fonts,
            images: self.images,
            radius,
            templates: RankTemplates {
                level: self.level_text,
                rank: self.rank_text,
                xp: self.xp_text,
            },
        })
    }
}

fn bar_color(spec: &BarColorSpec) -> Result<BarColor> {
    match spec {
        BarColorSpec::Flat(color) => Ok(BarColor::Flat(parse_color("bar", color)?)),
        BarColorSpec::Gradient(stops) if stops.is_empty() => Err(CardError::EmptyGradient),
        BarColorSpec::Gradient(stops) => stops
            .iter()
            .map(|stop| {
                if !(0. ..=1.).contains(&stop.position) {
                    return Err(CardError::StopOutOfRange(stop.position));
                }
                Ok(Stop {
                    color: parse_color("bar", &stop.color)?,
                    position: stop.position,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(BarColor::Gradient),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RankColors {
    pub(crate) bar: BarColor,
    pub(crate) stroke: Color,
    pub(crate) username: Color,
    pub(crate) nickname: Color,
    pub(crate) rank: Color,
    pub(crate) level: Color,
    pub(crate) xp: Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RankFonts {
    pub(crate) username: String,
    pub(crate) nickname: String,
    pub(crate) rank: String,
    pub(crate) level: String,
    pub(crate) xp: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RankTemplates {
    pub(crate) level: String,
    pub(crate) rank: String,
    pub(crate) xp: String,
}

/// A validated rank card, drawn on a 1020x320 canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct RankCard {
    pub(crate) username: String,
    pub(crate) nickname: String,
    pub(crate) rank: Rank,
    pub(crate) level: u64,
    pub(crate) xp: Xp,
    pub(crate) colors: RankColors,
    pub(crate) fonts: RankFonts,
    pub(crate) images: ImageRefs,
    pub(crate) radius: f64,
    pub(crate) templates: RankTemplates,
}

impl RankCard {
    pub fn builder() -> RankCardBuilder {
        RankCardBuilder::default()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn xp(&self) -> Xp {
        self.xp
    }

    /// Draws the card with already resolved images and returns it PNG encoded.
    pub fn render(&self, images: &CardImages, fonts: &FontRegistry) -> Result<Vec<u8>> {
        rank_card::gen_rank_card(self, images, fonts)
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
fn test_default_card_is_valid() {
    let card = RankCard::builder().build().unwrap();
    assert_eq!(card.username(), "Username#0000");
    assert_eq!(card.xp(), Xp::new(30, 100).unwrap());
    assert_eq!(card.radius, 25.);
}

#[test]
fn test_xp_above_max_is_rejected() {
    let err = RankCard::builder().xp(120, 100).build().unwrap_err();
    assert!(matches!(
        err,
        CardError::XpExceedsMax {
            current: 120,
            max: 100
        }
    ));
    assert!(err.is_validation());
}

#[test]
fn test_xp_equal_to_max_is_accepted() {
    assert!(RankCard::builder().xp(380, 380).build().is_ok());
}

#[test]
fn test_rank_accepts_text() {
    let card = RankCard::builder().rank("3").build().unwrap();
    assert_eq!(card.rank.to_string(), "3");
    let card = RankCard::builder().rank(12_u64).build().unwrap();
    assert_eq!(card.rank.to_string(), "12");
}

#[test]
fn test_invalid_text_color_is_rejected() {
    let err = RankCard::builder()
        .color(RankText::Level, "not a color")
        .build()
        .unwrap_err();
    assert!(matches!(err, CardError::InvalidColor { field: "level", .. }));
}

#[test]
fn test_gradient_stops_are_validated_but_not_sorted() {
    let card = RankCard::builder()
        .bar_gradient([("#ff0000", 1.), ("#0000ff", 0.)])
        .build()
        .unwrap();
    let BarColor::Gradient(stops) = &card.colors.bar else {
        panic!("expected a gradient");
    };
    assert_eq!(stops[0].position, 1.);
    assert_eq!(stops[1].position, 0.);

    let err = RankCard::builder()
        .bar_gradient([("#ff0000", 1.5)])
        .build()
        .unwrap_err();
    assert!(matches!(err, CardError::StopOutOfRange(p) if p == 1.5));

    let err = RankCard::builder()
        .bar_gradient(Vec::<(&str, f32)>::new())
        .build()
        .unwrap_err();
    assert!(matches!(err, CardError::EmptyGradient));
}

#[test]
fn test_empty_font_is_rejected() {
    let err = RankCard::builder()
        .font(RankText::Xp, "  ")
        .build()
        .unwrap_err();
    assert!(matches!(err, CardError::EmptyFontFamily("xp")));
}

#[test]
fn test_builder_from_json() {
    let builder: RankCardBuilder = serde_json::from_str(
        r##"{
            "username": "Swich",
            "rank": "#1",
            "level": 4,
            "xp": { "current": 75, "max": 380 },
            "colors": { "bar": [{ "hex": "#ff0000", "position": 0 }, { "hex": "#ffcc00", "position": 1 }] }
        }"##,
    )
    .unwrap();
    let card = builder.build().unwrap();
    assert_eq!(card.rank, Rank::Label("#1".to_owned()));
    assert_eq!(card.xp().current(), 75);
    assert_eq!(card.templates.level, "Level {level}");
    assert!(matches!(card.colors.bar, BarColor::Gradient(ref stops) if stops.len() == 2));
}

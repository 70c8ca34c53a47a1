use piet_common::{kurbo::Point, Color, FontFamily, Text, TextLayout, TextLayoutBuilder};

use crate::error::Result;

const MIN_FONT_SIZE: f64 = 8.;
const SHRINK_STEP: f64 = 0.5;
const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

/// Font, color and placement of one label. `anchor.y` is the baseline of the text.
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub font: FontFamily,
    pub size: f64,
    pub color: Color,
    pub align: Align,
    pub anchor: Point,
    pub max_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Level,
    Rank,
    Current,
    Max,
}

impl Placeholder {
    pub const fn token(self) -> &'static str {
        match self {
            Self::Level => "{level}",
            Self::Rank => "{rank}",
            Self::Current => "{current}",
            Self::Max => "{max}",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTransform {
    Upper,
}

/// Replaces every occurrence of each placeholder of `substitutions` in `template`, then
/// applies `transform`.
pub fn render_label(
    template: &str,
    substitutions: &[(Placeholder, String)],
    transform: Option<CaseTransform>,
) -> String {
    let label = substitutions
        .iter()
        .fold(template.to_owned(), |label, (placeholder, value)| {
            label.replace(placeholder.token(), value)
        });

    match transform {
        Some(CaseTransform::Upper) => label.to_uppercase(),
        None => label,
    }
}

/// Substitutions of an xp label, both amounts abbreviated.
pub fn xp_substitutions(current: u64, max: u64) -> [(Placeholder, String); 2] {
    [
        (Placeholder::Current, abbreviate(current)),
        (Placeholder::Max, abbreviate(max)),
    ]
}

/// Short form of a count: `999`, `1K`, `12K`, `1.2M`.
///
/// The suffix tier is a third of the digit count, so a 6 digit value is expressed in
/// millions (`123456` gives `0.1M`).
pub fn abbreviate(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }

    let tier = (n.to_string().len() / 3).min(SUFFIXES.len() - 1);
    let scaled = n as f64 / 1000f64.powi(tier as i32);

    let mut short = round_significant(scaled, 2);
    if digit_count(short) > 2 {
        short = round_significant(scaled, 1);
    }

    let number = if short.fract() == 0. {
        format!("{short}")
    } else {
        format!("{short:.1}")
    };
    format!("{number}{}", SUFFIXES[tier])
}

/// Rounds `value` to `digits` significant digits, looking at its exact decimal expansion
/// and rounding ties up. `1150 / 1000` is stored as `1.1499..` and gives `1.1`.
fn round_significant(value: f64, digits: usize) -> f64 {
    if value == 0. || !value.is_finite() {
        return value;
    }
    let expansion = format!("{:.40e}", value.abs());
    let Some((mantissa, exponent)) = expansion.split_once('e') else {
        return value;
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value;
    };

    let mut significant = mantissa.bytes().filter(u8::is_ascii_digit).map(|d| u64::from(d - b'0'));
    let mut kept = significant.by_ref().take(digits).fold(0, |acc, d| acc * 10 + d);
    if significant.next().is_some_and(|d| d >= 5) {
        kept += 1;
    }

    let rounded = format!("{kept}e{}", exponent - digits as i32 + 1)
        .parse::<f64>()
        .unwrap_or(value);
    rounded.copysign(value)
}

fn digit_count(value: f64) -> usize {
    format!("{value}").chars().filter(char::is_ascii_digit).count()
}

/// Lays out `string`, shrinking the font until the text fits in the style's max width.
pub fn fit_layout<T: Text>(
    text: &mut T,
    string: &str,
    style: &TextStyle,
    color: Color,
) -> Result<T::TextLayout> {
    let mut size = style.size;
    loop {
        let layout = text
            .new_text_layout(string.to_owned())
            .font(style.font.clone(), size)
            .text_color(color)
            .build()?;

        let width = layout.size().width;
        if width <= style.max_width || size <= MIN_FONT_SIZE {
            break Ok(layout);
        }

        size = (size * style.max_width / width)
            .min(size - SHRINK_STEP)
            .max(MIN_FONT_SIZE);
    }
}

/// Top-left point where `layout` has to be drawn for its baseline to sit on the anchor.
pub fn text_origin(layout: &impl TextLayout, style: &TextStyle) -> Point {
    let metrics = layout.line_metric(0).unwrap_or_default();
    Point::new(
        aligned_x(style.anchor.x, layout.size().width, style.align),
        style.anchor.y - metrics.baseline,
    )
}

fn aligned_x(anchor_x: f64, width: f64, align: Align) -> f64 {
    match align {
        Align::Left => anchor_x,
        Align::Right => anchor_x - width,
        Align::Center => 0.5f64.mul_add(-width, anchor_x),
    }
}

#[test]
fn test_abbreviate() {
    assert_eq!(abbreviate(0), "0");
    assert_eq!(abbreviate(999), "999");
    assert_eq!(abbreviate(1000), "1K");
    assert_eq!(abbreviate(12345), "12K");
    assert_eq!(abbreviate(1_234_567), "1.2M");
}

#[test]
fn test_abbreviate_tiers() {
    assert_eq!(abbreviate(1500), "1.5K");
    assert_eq!(abbreviate(99_999), "100K");
    assert_eq!(abbreviate(123_456), "0.1M");
    assert_eq!(abbreviate(999_999), "1M");
    assert_eq!(abbreviate(3_000_000_000), "3B");
    assert_eq!(abbreviate(4_500_000_000_000), "4.5T");
}

#[test]
fn test_abbreviate_rounds_the_stored_value() {
    // 1.15 and 1.95 are stored slightly below, 1.25 is exact and rounds up
    assert_eq!(abbreviate(1150), "1.1K");
    assert_eq!(abbreviate(1250), "1.3K");
    assert_eq!(abbreviate(1950), "1.9K");
    assert_eq!(abbreviate(2050), "2K");
    assert_eq!(abbreviate(5850), "5.8K");
}

#[test]
fn test_round_significant() {
    assert_eq!(round_significant(1.25, 2), 1.3);
    assert_eq!(round_significant(99.999, 2), 100.);
    assert_eq!(round_significant(99.999, 1), 100.);
    assert_eq!(round_significant(0.123_456, 1), 0.1);
}

#[test]
fn test_level_label_is_uppercased() {
    let label = render_label(
        "Level {level}",
        &[(Placeholder::Level, 7.to_string())],
        Some(CaseTransform::Upper),
    );
    assert_eq!(label, "LEVEL 7");
}

#[test]
fn test_rank_label() {
    let label = render_label("#{rank}", &[(Placeholder::Rank, "3".to_owned())], None);
    assert_eq!(label, "#3");
}

#[test]
fn test_every_occurrence_is_replaced() {
    let label = render_label(
        "{level} / {level} ({rank})",
        &[
            (Placeholder::Level, "4".to_owned()),
            (Placeholder::Rank, "#2".to_owned()),
        ],
        None,
    );
    assert_eq!(label, "4 / 4 (#2)");
}

#[test]
fn test_xp_label_is_abbreviated() {
    let label = render_label("XP: {current} / {max}", &xp_substitutions(1500, 12_345), None);
    assert_eq!(label, "XP: 1.5K / 12K");
}

#[test]
fn test_aligned_x() {
    assert_eq!(aligned_x(965., 100., Align::Right), 865.);
    assert_eq!(aligned_x(265., 100., Align::Left), 265.);
    assert_eq!(aligned_x(642., 100., Align::Center), 592.);
}

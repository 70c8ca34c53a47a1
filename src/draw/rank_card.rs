use piet_common::{
    kurbo::{Point, Rect, Vec2},
    Color, RenderContext,
};
use tracing::{info, instrument};

use super::{
    bar::{bar_paint, filled_length, FILL_ALPHA},
    compositor::{Compositor, Paint, Shadow},
    image_rect,
    label::{render_label, xp_substitutions, Align, CaseTransform, Placeholder, TextStyle},
    render_to_png,
    shapes::rounded_rect_path,
    TEXT_SHADOW,
};
use crate::{
    cards::rank::RankCard,
    error::Result,
    fonts::FontRegistry,
    images::CardImages,
};

pub const CARD_WIDTH: usize = 1020;
pub const CARD_HEIGHT: usize = 320;

const BACKGROUND_RECT: (f64, f64, f64, f64) = (-30., -120., 1085., 555.);

const AVATAR_RECT: (f64, f64, f64, f64) = (35., 25., 200., 200.);
const AVATAR_RADIUS: f64 = 35.;
const AVATAR_STROKE_WIDTH: f64 = 12.;

const TRACK_X: f64 = 35.;
const TRACK_Y: f64 = 250.;
pub const TRACK_WIDTH: f64 = 950.;
const TRACK_HEIGHT: f64 = 45.;
const TRACK_RADIUS: f64 = 10.;
const TRACK_ALPHA: f64 = 0.45;
const TRACK_GLOW: Shadow = Shadow {
    blur: 30.,
    color: Color::rgba8(0xff, 0xff, 0xff, 0xff),
    offset: Vec2::ZERO,
};

/// Draws `card` and returns it PNG encoded.
#[instrument(skip_all, fields(username = %card.username))]
pub fn gen_rank_card(card: &RankCard, images: &CardImages, fonts: &FontRegistry) -> Result<Vec<u8>> {
    info!("Start drawing rank card.");

    let styles = LabelStyles::new(card, fonts)?;
    let buf = render_to_png(CARD_WIDTH, CARD_HEIGHT, |rc| {
        draw_rank_card(&mut Compositor::new(rc), card, images, &styles)
    })?;
    info!("Rank card encoded in PNG");

    Ok(buf)
}

struct LabelStyles {
    username: TextStyle,
    nickname: TextStyle,
    level: TextStyle,
    rank: TextStyle,
    xp: TextStyle,
}

impl LabelStyles {
    fn new(card: &RankCard, fonts: &FontRegistry) -> Result<Self> {
        let style = |font: &str, size, color, align, (x, y), max_width| -> Result<TextStyle> {
            Ok(TextStyle {
                font: fonts.get(font)?,
                size,
                color,
                align,
                anchor: Point::new(x, y),
                max_width,
            })
        };
        let (colors, families) = (&card.colors, &card.fonts);

        Ok(Self {
            username: style(&families.username, 50., colors.username, Align::Left, (265., 70.), 570.)?,
            nickname: style(&families.nickname, 30., colors.nickname, Align::Left, (265., 110.), 270.)?,
            level: style(&families.level, 55., colors.level, Align::Left, (270., 230.), 385.)?,
            rank: style(&families.rank, 40., colors.rank, Align::Right, (965., 65.), 570.)?,
            xp: style(&families.xp, 35., colors.xp, Align::Right, (965., 230.), 400.)?,
        })
    }
}

/// The labels of the card, placeholders substituted.
pub(crate) fn labels(card: &RankCard) -> (String, String, String) {
    let level = render_label(
        &card.templates.level,
        &[(Placeholder::Level, card.level.to_string())],
        Some(CaseTransform::Upper),
    );
    let rank = render_label(
        &card.templates.rank,
        &[(Placeholder::Rank, card.rank.to_string())],
        None,
    );
    let xp = render_label(
        &card.templates.xp,
        &xp_substitutions(card.xp.current(), card.xp.max()),
        None,
    );
    (level, rank, xp)
}

fn draw_rank_card<R: RenderContext>(
    compositor: &mut Compositor<'_, R>,
    card: &RankCard,
    images: &CardImages,
    styles: &LabelStyles,
) -> Result<()> {
    let width = CARD_WIDTH as f64;
    let height = CARD_HEIGHT as f64;

    compositor.pass("background", |pass| {
        pass.clip(&rounded_rect_path(
            Rect::new(0., 0., width, height),
            card.radius,
        ));
        let (x, y, w, h) = BACKGROUND_RECT;
        pass.draw_image(&images.background, image_rect(x, y, w, h))
    })?;

    compositor.pass("avatar", |pass| {
        let (x, y, w, h) = AVATAR_RECT;
        let frame = rounded_rect_path(image_rect(x, y, w, h), AVATAR_RADIUS);

        pass.set_shadow(TEXT_SHADOW);
        pass.fill(&frame, &Paint::Solid(card.colors.stroke))?;
        pass.clear_shadow();
        pass.stroke(&frame, card.colors.stroke, AVATAR_STROKE_WIDTH);

        pass.clip(&frame);
        pass.draw_image(&images.avatar, image_rect(x, y, w, h))
    })?;

    compositor.pass("progress bar", |pass| {
        let track = rounded_rect_path(
            image_rect(TRACK_X, TRACK_Y, TRACK_WIDTH, TRACK_HEIGHT),
            TRACK_RADIUS,
        );
        pass.set_alpha(TRACK_ALPHA).set_shadow(TRACK_GLOW);
        pass.fill(&track, &Paint::Solid(Color::WHITE))?;
        pass.clear_shadow().clip(&track);

        let filled = filled_length(card.xp.current(), card.xp.max(), TRACK_WIDTH);
        if filled <= 0. {
            return Ok(());
        }
        let fill = image_rect(TRACK_X, TRACK_Y, filled, TRACK_HEIGHT);
        pass.set_alpha(FILL_ALPHA);
        pass.fill(
            &rounded_rect_path(fill, 0.),
            &bar_paint(&card.colors.bar, fill, height),
        )
    })?;

    let (level, rank, xp) = labels(card);
    let texts = [
        (card.username.as_str(), &styles.username),
        (card.nickname.as_str(), &styles.nickname),
        (level.as_str(), &styles.level),
        (rank.as_str(), &styles.rank),
        (xp.as_str(), &styles.xp),
    ];
    for (text, style) in texts {
        compositor.pass("label", |pass| {
            pass.set_shadow(TEXT_SHADOW);
            pass.draw_text(text, style)
        })?;
    }

    info!("Rank card drawn in {} passes", compositor.passes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::images::ResolvedImage;

    fn solid(color: [u8; 4]) -> ResolvedImage {
        RgbaImage::from_pixel(64, 64, Rgba(color)).into()
    }

    fn fonts() -> FontRegistry {
        FontRegistry::bundled(&mut piet_common::PietText::new())
    }

    #[test]
    fn test_labels() {
        let card = RankCard::builder()
            .level(7)
            .rank("3")
            .xp(1500, 12_345)
            .build()
            .unwrap();
        let (level, rank, xp) = labels(&card);
        assert_eq!(level, "LEVEL 7");
        assert_eq!(rank, "#3");
        assert_eq!(xp, "XP: 1.5K / 12K");
    }

    #[test]
    fn test_gen_rank_card_size() {
        let card = RankCard::builder().build().unwrap();
        let images = CardImages {
            avatar: solid([0x58, 0x65, 0xf2, 0xff]),
            background: solid([0x23, 0x23, 0x23, 0xff]),
        };

        let png = gen_rank_card(&card, &images, &fonts()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(
            (decoded.width(), decoded.height()),
            (CARD_WIDTH as u32, CARD_HEIGHT as u32)
        );
    }

    #[test]
    fn test_gen_rank_card_is_deterministic() {
        let card = RankCard::builder()
            .username("Meeeeeeelent")
            .bar_gradient([("#ff0000", 0.), ("#ffcc00", 0.5), ("#00ff00", 1.)])
            .xp(760, 1000)
            .build()
            .unwrap();
        let images = CardImages {
            avatar: solid([0xad, 0x8a, 0x56, 0xff]),
            background: solid([0x57, 0x57, 0x57, 0xff]),
        };
        let fonts = fonts();

        let first = gen_rank_card(&card, &images, &fonts).unwrap();
        let second = gen_rank_card(&card, &images, &fonts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fallback_avatar_is_drawn() {
        let card = RankCard::builder().build().unwrap();
        let fallback = RgbaImage::from_pixel(64, 64, Rgba([0x2b, 0x2d, 0x31, 0xff]));
        let images = CardImages {
            avatar: ResolvedImage::Fallback(fallback.into()),
            background: solid([0xff, 0xff, 0xff, 0xff]),
        };

        let png = gen_rank_card(&card, &images, &fonts()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        // Center of the avatar frame
        assert_eq!(decoded.get_pixel(135, 125), &Rgba([0x2b, 0x2d, 0x31, 0xff]));
    }

    #[test]
    fn test_unregistered_font_fails_before_drawing() {
        let card = RankCard::builder().build().unwrap();
        let images = CardImages {
            avatar: solid([0, 0, 0, 0xff]),
            background: solid([0, 0, 0, 0xff]),
        };
        let err = gen_rank_card(&card, &images, &FontRegistry::new()).unwrap_err();
        assert!(matches!(err, crate::CardError::FontNotRegistered(_)));
    }
}

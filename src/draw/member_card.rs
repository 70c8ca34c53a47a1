use piet_common::{kurbo::Point, RenderContext};
use tracing::{info, instrument};

use super::{
    compositor::{Compositor, Paint},
    image_rect,
    label::{Align, TextStyle},
    render_to_png,
    shapes::{circle_path, rounded_rect_path},
    TEXT_SHADOW,
};
use crate::{
    cards::member::MemberCard,
    error::Result,
    fonts::FontRegistry,
    images::CardImages,
};

pub const CARD_WIDTH: usize = 1260;
pub const CARD_HEIGHT: usize = 620;

const BACKGROUND_RECT: (f64, f64, f64, f64) = (-10., -50., 1280., 720.);

const BOX_RECT: (f64, f64, f64, f64) = (63., 50., 1134., 520.);
const BOX_RADIUS: f64 = 10.;
const BOX_ALPHA: f64 = 0.5;
const COUNT_IN_BOX: (f64, f64) = (1150., 120.);
const COUNT_ON_BACKGROUND: (f64, f64) = (1200., 80.);

const FRAME_RECT: (f64, f64, f64, f64) = (500., 90., 260., 260.);
const FRAME_STROKE_WIDTH: f64 = 15.;
const AVATAR_RECT: (f64, f64, f64, f64) = (520., 110., 220., 220.);

const TEXT_CENTER_X: f64 = 642.;
const TEXT_MAX_WIDTH: f64 = 1050.;

/// Draws `card` and returns it PNG encoded.
#[instrument(skip_all, fields(username = %card.username))]
pub fn gen_member_card(
    card: &MemberCard,
    images: &CardImages,
    fonts: &FontRegistry,
) -> Result<Vec<u8>> {
    info!("Start drawing member card.");

    let styles = LabelStyles::new(card, fonts)?;
    let buf = render_to_png(CARD_WIDTH, CARD_HEIGHT, |rc| {
        draw_member_card(&mut Compositor::new(rc), card, images, &styles)
    })?;
    info!("Member card encoded in PNG");

    Ok(buf)
}

struct LabelStyles {
    member_count: TextStyle,
    title: TextStyle,
    username: TextStyle,
    description: TextStyle,
}

impl LabelStyles {
    fn new(card: &MemberCard, fonts: &FontRegistry) -> Result<Self> {
        let (colors, families) = (&card.colors, &card.fonts);
        let (count_x, count_y) = if card.show_box {
            COUNT_IN_BOX
        } else {
            COUNT_ON_BACKGROUND
        };
        let centered = |font: &str, size, color, y| -> Result<TextStyle> {
            Ok(TextStyle {
                font: fonts.get(font)?,
                size,
                color,
                align: Align::Center,
                anchor: Point::new(TEXT_CENTER_X, y),
                max_width: TEXT_MAX_WIDTH,
            })
        };

        Ok(Self {
            member_count: TextStyle {
                font: fonts.get(&families.member_count)?,
                size: 45.,
                color: colors.member_count,
                align: Align::Right,
                anchor: Point::new(count_x, count_y),
                max_width: 430.,
            },
            title: centered(&families.title, 80., colors.title, 430.)?,
            username: centered(&families.username, 45., colors.username, 490.)?,
            description: centered(&families.description, 35., colors.description, 540.)?,
        })
    }
}

/// Text of the member count badge.
pub(crate) fn member_count_label(count: u64) -> String {
    format!("#{count}")
}

fn draw_member_card<R: RenderContext>(
    compositor: &mut Compositor<'_, R>,
    card: &MemberCard,
    images: &CardImages,
    styles: &LabelStyles,
) -> Result<()> {
    let width = CARD_WIDTH as f64;
    let height = CARD_HEIGHT as f64;

    compositor.pass("background", |pass| {
        pass.clip(&rounded_rect_path(
            image_rect(0., 0., width, height),
            card.radius,
        ));
        let (x, y, w, h) = BACKGROUND_RECT;
        pass.draw_image(&images.background, image_rect(x, y, w, h))
    })?;

    let count = member_count_label(card.member_count);
    if card.show_box {
        compositor.pass("member count box", |pass| {
            let (x, y, w, h) = BOX_RECT;
            pass.set_alpha(BOX_ALPHA);
            pass.fill(
                &rounded_rect_path(image_rect(x, y, w, h), BOX_RADIUS),
                &Paint::Solid(card.colors.box_color),
            )?;
            pass.set_alpha(1.);
            pass.draw_text(&count, &styles.member_count)
        })?;
    } else {
        compositor.pass("member count", |pass| {
            pass.set_shadow(TEXT_SHADOW);
            pass.draw_text(&count, &styles.member_count)
        })?;
    }

    compositor.pass("avatar", |pass| {
        let (x, y, w, h) = FRAME_RECT;
        pass.stroke(&circle_path(x, y, w, h), card.colors.stroke, FRAME_STROKE_WIDTH);

        let (x, y, w, h) = AVATAR_RECT;
        pass.clip(&circle_path(x, y, w, h));
        pass.draw_image(&images.avatar, image_rect(x, y, w, h))
    })?;

    let texts = [
        (card.title.as_str(), &styles.title),
        (card.username.as_str(), &styles.username),
        (card.description.as_str(), &styles.description),
    ];
    for (text, style) in texts {
        compositor.pass("label", |pass| {
            pass.set_shadow(TEXT_SHADOW);
            pass.draw_text(text, style)
        })?;
    }

    info!("Member card drawn in {} passes", compositor.passes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::images::ResolvedImage;

    fn solid(color: [u8; 4]) -> ResolvedImage {
        RgbaImage::from_pixel(32, 32, Rgba(color)).into()
    }

    fn images() -> CardImages {
        CardImages {
            avatar: solid([0xc9, 0xb0, 0x37, 0xff]),
            background: solid([0x23, 0x23, 0x23, 0xff]),
        }
    }

    fn fonts() -> FontRegistry {
        FontRegistry::bundled(&mut piet_common::PietText::new())
    }

    #[test]
    fn test_member_count_label() {
        assert_eq!(member_count_label(150), "#150");
    }

    #[test]
    fn test_gen_member_card_size() {
        for show_box in [true, false] {
            let card = MemberCard::builder()
                .member_count(4_213)
                .show_box(show_box, None)
                .build()
                .unwrap();
            let png = gen_member_card(&card, &images(), &fonts()).unwrap();
            let decoded = image::load_from_memory(&png).unwrap();
            assert_eq!(
                (decoded.width(), decoded.height()),
                (CARD_WIDTH as u32, CARD_HEIGHT as u32)
            );
        }
    }

    #[test]
    fn test_gen_member_card_is_deterministic() {
        let card = MemberCard::builder()
            .username("Bobish")
            .title("BIENVENUE")
            .build()
            .unwrap();
        let fonts = fonts();
        let first = gen_member_card(&card, &images(), &fonts).unwrap();
        let second = gen_member_card(&card, &images(), &fonts).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_box_darkens_the_background() {
        let pixel_at = |show_box| {
            let card = MemberCard::builder()
                .show_box(show_box, None)
                .build()
                .unwrap();
            let png = gen_member_card(&card, &images(), &fonts()).unwrap();
            let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
            // Inside the box, left of the avatar and above the labels
            *decoded.get_pixel(150, 300)
        };

        assert_eq!(pixel_at(false), Rgba([0x23, 0x23, 0x23, 0xff]));

        // #0d0d0d at half alpha over #232323
        let Rgba([r, g, b, a]) = pixel_at(true);
        assert_eq!(a, 0xff);
        for channel in [r, g, b] {
            assert!(channel.abs_diff(0x18) <= 2, "{channel:#x}");
        }
    }

    #[test]
    fn test_avatar_is_clipped_to_a_circle() {
        let card = MemberCard::builder().build().unwrap();
        let png = gen_member_card(&card, &images(), &fonts()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

        // Center of the avatar circle
        assert_eq!(decoded.get_pixel(630, 220), &Rgba([0xc9, 0xb0, 0x37, 0xff]));
        // Corner of the avatar square, outside of the circle but inside the box
        assert_ne!(decoded.get_pixel(522, 112), &Rgba([0xc9, 0xb0, 0x37, 0xff]));
    }
}

use cardgen::{
    draw::{member_card, rank_card},
    images, CardError, FontRegistry, ImageResolver, MemberCard, RankCard,
};
use piet_common::PietText;

fn resolver() -> ImageResolver {
    ImageResolver::with_timeout(std::time::Duration::from_secs(1), images::placeholder()).unwrap()
}

#[tokio::test]
async fn rank_card_with_missing_images_uses_fallback() {
    let fonts = FontRegistry::bundled(&mut PietText::new());
    let card = RankCard::builder()
        .username("Swich")
        .nickname("swich")
        .rank(3_u64)
        .level(12)
        .xp(1_250, 4_000)
        .avatar("does/not/exist.png", Some("#ff0000"))
        .background("does/not/exist/either.png")
        .build()
        .unwrap();

    let png = card.render_with(&resolver(), &fonts).await.unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(
        (decoded.width(), decoded.height()),
        (rank_card::CARD_WIDTH as u32, rank_card::CARD_HEIGHT as u32)
    );
}

#[tokio::test]
async fn member_card_with_missing_images_uses_fallback() {
    let fonts = FontRegistry::bundled(&mut PietText::new());
    let card = MemberCard::builder()
        .username("Bobish")
        .member_count(7)
        .avatar("does/not/exist.png", None)
        .background("does/not/exist/either.png")
        .build()
        .unwrap();

    let png = card.render_with(&resolver(), &fonts).await.unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(
        (decoded.width(), decoded.height()),
        (member_card::CARD_WIDTH as u32, member_card::CARD_HEIGHT as u32)
    );
}

#[test]
fn xp_over_max_is_rejected() {
    let err = RankCard::builder().xp(500, 100).build().unwrap_err();
    assert!(matches!(err, CardError::XpExceedsMax { current: 500, max: 100 }));
    assert!(err.is_validation());
}

#[test]
fn unregistered_font_fails_before_drawing() {
    let card = RankCard::builder()
        .font(cardgen::cards::rank::RankText::Username, "Comic Sans MS")
        .build()
        .unwrap();
    let images = cardgen::CardImages {
        avatar: images::placeholder().into(),
        background: images::placeholder().into(),
    };
    let err = card.render(&images, &FontRegistry::new()).unwrap_err();
    assert!(matches!(err, CardError::FontNotRegistered(_)));
}

//! Rank and member card images.
//!
//! A card is described with a builder, validated into an immutable model, then drawn
//! over a fixed size canvas and returned PNG encoded:
//!
//! ```ignore
//! let fonts = FontRegistry::bundled(&mut PietText::new());
//! let card = RankCard::builder().username("Swich").level(4).xp(75, 380).build()?;
//! let png = card.render_with(&ImageResolver::default(), &fonts).await?;
//! ```

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

pub mod cards;
pub mod config;
pub mod draw;
pub mod error;
pub mod fonts;
pub mod images;

pub use cards::{
    member::{MemberCard, MemberCardBuilder},
    rank::{RankCard, RankCardBuilder},
};
pub use config::Config;
pub use error::{CardError, Result};
pub use fonts::FontRegistry;
pub use images::{CardImages, ImageResolver, ResolvedImage};

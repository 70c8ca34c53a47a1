use std::{path::Path, sync::Arc, time::Duration};

use image::{Rgba, RgbaImage};
use tracing::{debug, info, instrument, warn};

const PLACEHOLDER_SIZE: u32 = 256;
const PLACEHOLDER_COLOR: Rgba<u8> = Rgba([0x2b, 0x2d, 0x31, 0xff]);

/// A decoded image ready to be drawn.
#[derive(Debug, Clone)]
pub enum ResolvedImage {
    Loaded(Arc<RgbaImage>),
    /// The reference could not be loaded, the placeholder stands in for it.
    Fallback(Arc<RgbaImage>),
}

impl ResolvedImage {
    pub fn pixels(&self) -> &RgbaImage {
        match self {
            Self::Loaded(image) | Self::Fallback(image) => image,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

impl From<RgbaImage> for ResolvedImage {
    fn from(image: RgbaImage) -> Self {
        Self::Loaded(Arc::new(image))
    }
}

/// The two images drawn on every card.
#[derive(Debug, Clone)]
pub struct CardImages {
    pub avatar: ResolvedImage,
    pub background: ResolvedImage,
}

/// Turns image references into decoded images.
///
/// `http://` and `https://` references are downloaded, anything else is read from disk.
/// Resolution never fails: on any error the fallback image is returned instead.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    client: reqwest::Client,
    fallback: Arc<RgbaImage>,
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(reqwest::Client::new(), placeholder())
    }
}

impl ImageResolver {
    pub fn new(client: reqwest::Client, fallback: RgbaImage) -> Self {
        Self {
            client,
            fallback: Arc::new(fallback),
        }
    }

    /// Resolver whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration, fallback: RgbaImage) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::new(client, fallback))
    }

    pub fn fallback(&self) -> ResolvedImage {
        ResolvedImage::Fallback(Arc::clone(&self.fallback))
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, reference: &str) -> ResolvedImage {
        match self.load(reference).await {
            Ok(image) => {
                debug!("Loaded {}x{} image", image.width(), image.height());
                ResolvedImage::Loaded(Arc::new(image))
            }
            Err(e) => {
                warn!("Cannot load image {reference:?}, using fallback: {e}");
                self.fallback()
            }
        }
    }

    /// Resolves the avatar and the background concurrently.
    pub async fn resolve_card(&self, avatar: &str, background: &str) -> CardImages {
        let (avatar, background) = tokio::join!(self.resolve(avatar), self.resolve(background));
        CardImages { avatar, background }
    }

    async fn load(&self, reference: &str) -> anyhow::Result<RgbaImage> {
        let reference = reference.trim();
        let bytes = if is_remote(reference) {
            let response = self.client.get(reference).send().await?.error_for_status()?;
            let bytes = response.bytes().await?;
            info!("Received {} bytes from {reference}", bytes.len());
            bytes.to_vec()
        } else {
            tokio::fs::read(reference).await?
        };

        Ok(image::load_from_memory(&bytes)?.to_rgba8())
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Loads the fallback image at `path`, or builds the built-in placeholder when no path is
/// given.
pub fn load_fallback(path: Option<&Path>) -> anyhow::Result<RgbaImage> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(path)?;
            info!("Loaded fallback image {}", path.display());
            Ok(image::load_from_memory(&bytes)?.to_rgba8())
        }
        None => Ok(placeholder()),
    }
}

/// Flat dark square used when no fallback image is configured.
pub fn placeholder() -> RgbaImage {
    RgbaImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, PLACEHOLDER_COLOR)
}

#[test]
fn test_remote_references() {
    assert!(is_remote("https://cdn.discordapp.com/avatars/1/a.png"));
    assert!(is_remote("http://example.com/bg.jpg"));
    assert!(!is_remote("assets/images/background.png"));
    assert!(!is_remote("ftp://example.com/a.png"));
}

#[tokio::test]
async fn test_missing_file_resolves_to_fallback() {
    let resolver = ImageResolver::default();
    let image = resolver.resolve("assets/does/not/exist.png").await;
    assert!(image.is_fallback());
    assert_eq!(image.pixels().get_pixel(0, 0), &PLACEHOLDER_COLOR);
}

#[tokio::test]
async fn test_undecodable_file_resolves_to_fallback() {
    let resolver = ImageResolver::default();
    // A rust source file is not an image.
    let image = resolver.resolve(file!()).await;
    assert!(image.is_fallback());
}

#[tokio::test]
async fn test_local_file_is_loaded() {
    let path = std::env::temp_dir().join("cardgen-test-local-image.png");
    RgbaImage::from_pixel(4, 4, Rgba([0xff, 0, 0, 0xff]))
        .save(&path)
        .unwrap();

    let resolver = ImageResolver::default();
    let image = resolver.resolve(path.to_str().unwrap()).await;
    assert!(!image.is_fallback());
    assert_eq!(image.pixels().dimensions(), (4, 4));
}

#[tokio::test]
async fn test_resolve_card_uses_fallback_per_slot() {
    let path = std::env::temp_dir().join("cardgen-test-card-avatar.png");
    RgbaImage::from_pixel(2, 2, Rgba([0, 0xff, 0, 0xff]))
        .save(&path)
        .unwrap();

    let resolver = ImageResolver::default();
    let images = resolver
        .resolve_card(path.to_str().unwrap(), "not/a/background.png")
        .await;
    assert!(!images.avatar.is_fallback());
    assert!(images.background.is_fallback());
}

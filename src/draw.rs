pub mod bar;
pub mod compositor;
pub mod label;
pub mod member_card;
pub mod rank_card;
pub mod shapes;

use image::{ImageEncoder, RgbaImage};
use piet_common::{
    kurbo::{Rect, Vec2},
    Color, Device, ImageFormat, Piet, RenderContext,
};
use tracing::{debug, instrument};

use crate::error::Result;
use compositor::Shadow;

/// Text shadow shared by both cards.
pub(crate) const TEXT_SHADOW: Shadow = Shadow {
    blur: 8.,
    color: Color::rgba8(0x0a, 0x0a, 0x0a, 0xff),
    offset: Vec2::new(-6., 8.),
};

/// Default color of the member card box.
pub(crate) const BOX_BLACK: Color = Color::rgba8(0x0d, 0x0d, 0x0d, 0xff);

/// Where an image is drawn: the destination rectangle, which may extend past the canvas.
pub(crate) fn image_rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(x, y, x + width, y + height)
}

#[instrument(skip(card_buf))]
fn to_png_buffer(card_buf: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let img = RgbaImage::from_raw(width, height, card_buf.to_vec()).ok_or_else(|| {
        image::ImageError::Parameter(image::error::ParameterError::from_kind(
            image::error::ParameterErrorKind::DimensionMismatch,
        ))
    })?;
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    encoder.write_image(&img, width, height, image::ColorType::Rgba8)?;

    Ok(buf)
}

/// Creates a bitmap of the given size, runs `draw` over it and encodes the result in PNG.
///
/// Every call owns its device and bitmap, so concurrent renders never share a surface.
pub(crate) fn render_to_png<F>(width: usize, height: usize, draw: F) -> Result<Vec<u8>>
where
    F: FnOnce(&mut Piet<'_>) -> Result<()>,
{
    let mut device = Device::new()?;
    let mut bitmap = device.bitmap_target(width, height, 1.0)?;
    {
        let mut rc = bitmap.render_context();
        debug!("Render context created");
        draw(&mut rc)?;
        rc.finish()?;
    }

    let card_buf = bitmap.to_image_buf(ImageFormat::RgbaSeparate)?;
    let buf = to_png_buffer(card_buf.raw_pixels(), width as u32, height as u32)?;
    debug!("Card encoded in PNG, {} bytes", buf.len());

    Ok(buf)
}

#[test]
fn test_png_buffer_keeps_dimensions() {
    let pixels = vec![0xff_u8; 4 * 3 * 2];
    let png = to_png_buffer(&pixels, 3, 2).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (3, 2));
}

#[test]
fn test_png_buffer_rejects_short_buffer() {
    assert!(to_png_buffer(&[0; 8], 3, 2).is_err());
}

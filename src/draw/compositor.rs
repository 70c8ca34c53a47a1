use piet_common::{
    kurbo::{BezPath, Rect, Shape, Vec2},
    Color, FixedLinearGradient, ImageFormat, InterpolationMode, RenderContext,
};
use tracing::{debug, trace};

use super::label::{fit_layout, text_origin, TextStyle};
use crate::{error::Result, images::ResolvedImage};

/// What a shape is filled with.
#[derive(Debug, Clone)]
pub enum Paint {
    Solid(Color),
    Gradient(FixedLinearGradient),
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

/// Drop shadow cast by fills and text of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shadow {
    pub blur: f64,
    pub color: Color,
    pub offset: Vec2,
}

/// Runs an ordered list of scoped passes over a single render context.
pub struct Compositor<'a, R: RenderContext> {
    rc: &'a mut R,
    passes: usize,
}

impl<'a, R: RenderContext> Compositor<'a, R> {
    pub fn new(rc: &'a mut R) -> Self {
        Self { rc, passes: 0 }
    }

    /// Runs `draw` between a save and a restore of the render context.
    ///
    /// Clip, alpha and shadow set inside the pass are gone once it returns, even when it
    /// fails.
    pub fn pass<F>(&mut self, name: &'static str, draw: F) -> Result<()>
    where
        F: FnOnce(&mut Pass<'_, R>) -> Result<()>,
    {
        self.passes += 1;
        debug!("Pass #{} {name}", self.passes);

        self.rc.save()?;
        let mut pass = Pass {
            rc: &mut *self.rc,
            alpha: 1.,
            shadow: None,
        };
        let drawn = draw(&mut pass);
        self.rc.restore()?;

        drawn
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

/// Drawing state of one pass. Everything here is dropped with the pass.
pub struct Pass<'a, R: RenderContext> {
    rc: &'a mut R,
    alpha: f64,
    shadow: Option<Shadow>,
}

impl<R: RenderContext> Pass<'_, R> {
    /// Global alpha multiplied into every fill, stroke and text color of the pass.
    pub fn set_alpha(&mut self, alpha: f64) -> &mut Self {
        self.alpha = alpha.clamp(0., 1.);
        self
    }

    pub fn set_shadow(&mut self, shadow: Shadow) -> &mut Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn clear_shadow(&mut self) -> &mut Self {
        self.shadow = None;
        self
    }

    /// Restricts every following draw of this pass to `path`.
    pub fn clip(&mut self, path: &BezPath) -> &mut Self {
        self.rc.clip(path);
        self
    }

    pub fn fill(&mut self, path: &BezPath, paint: &Paint) -> Result<()> {
        if let Some(shadow) = self.shadow {
            self.cast_shadow(shadow, path.bounding_box());
        }

        match paint {
            Paint::Solid(color) => {
                let color = apply_alpha(*color, self.alpha);
                self.rc.fill(path, &color);
            }
            Paint::Gradient(gradient) => {
                let mut gradient = gradient.clone();
                for stop in &mut gradient.stops {
                    stop.color = apply_alpha(stop.color, self.alpha);
                }
                let brush = self.rc.gradient(gradient)?;
                self.rc.fill(path, &brush);
            }
        }

        Ok(())
    }

    pub fn stroke(&mut self, path: &BezPath, color: Color, width: f64) {
        let color = apply_alpha(color, self.alpha);
        self.rc.stroke(path, &color, width);
    }

    /// Draws `image` stretched over `dst`; parts outside the current clip are dropped.
    pub fn draw_image(&mut self, image: &ResolvedImage, dst: Rect) -> Result<()> {
        let pixels = image.pixels();
        let handle = self.rc.make_image(
            pixels.width() as usize,
            pixels.height() as usize,
            pixels.as_raw(),
            ImageFormat::RgbaSeparate,
        )?;
        self.rc
            .draw_image(&handle, dst, InterpolationMode::Bilinear);
        trace!("Image drawn in {dst:?}");

        Ok(())
    }

    /// Lays out `string` with `style` and draws it at the style's anchor.
    pub fn draw_text(&mut self, string: &str, style: &TextStyle) -> Result<()> {
        let color = apply_alpha(style.color, self.alpha);
        let layout = fit_layout(self.rc.text(), string, style, color)?;
        let origin = text_origin(&layout, style);

        if let Some(shadow) = self.shadow {
            for (spread, weight) in shadow_taps(shadow.blur) {
                let shadow_color = apply_alpha(shadow.color, self.alpha * weight);
                let shadow_layout = fit_layout(self.rc.text(), string, style, shadow_color)?;
                self.rc
                    .draw_text(&shadow_layout, origin + shadow.offset + spread);
            }
        }
        self.rc.draw_text(&layout, origin);

        Ok(())
    }

    fn cast_shadow(&mut self, shadow: Shadow, bounds: Rect) {
        let color = apply_alpha(shadow.color, self.alpha);
        self.rc
            .blurred_rect(bounds + shadow.offset, shadow.blur, &color);
    }
}

/// Copies drawn to fake a blurred text shadow: a centered copy and a ring of fainter
/// ones a quarter of the blur away.
fn shadow_taps(blur: f64) -> Vec<(Vec2, f64)> {
    if blur <= 0. {
        return vec![(Vec2::ZERO, 1.)];
    }
    let r = blur / 4.;
    vec![
        (Vec2::ZERO, 0.5),
        (Vec2::new(r, 0.), 0.25),
        (Vec2::new(-r, 0.), 0.25),
        (Vec2::new(0., r), 0.25),
        (Vec2::new(0., -r), 0.25),
    ]
}

fn apply_alpha(color: Color, alpha: f64) -> Color {
    let (_, _, _, a) = color.as_rgba();
    color.with_alpha(a * alpha)
}

#[test]
fn test_apply_alpha_multiplies() {
    let color = Color::rgba8(0xff, 0xff, 0xff, 0xff);
    let (_, _, _, a) = apply_alpha(color, 0.65).as_rgba();
    assert!((a - 0.65).abs() < 0.01);

    let half = Color::rgba(1., 1., 1., 0.5);
    let (_, _, _, a) = apply_alpha(half, 0.5).as_rgba();
    assert!((a - 0.25).abs() < 0.01);
}

#[test]
fn test_shadow_taps() {
    assert_eq!(shadow_taps(0.), vec![(Vec2::ZERO, 1.)]);

    let taps = shadow_taps(8.);
    assert_eq!(taps.len(), 5);
    assert_eq!(taps[0], (Vec2::ZERO, 0.5));
    assert!(taps.iter().all(|(spread, _)| spread.hypot() <= 2.));
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::{
        draw::{render_to_png, shapes::rounded_rect_path, TEXT_SHADOW},
        CardError,
    };

    const BLUE: Color = Color::rgba8(0, 0, 0xff, 0xff);

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
        rounded_rect_path(Rect::new(x0, y0, x1, y1), 0.)
    }

    #[test]
    fn pass_state_does_not_leak() {
        let png = render_to_png(40, 40, |rc| {
            let mut compositor = Compositor::new(rc);
            compositor.pass("faded", |pass| {
                pass.set_alpha(0.2).set_shadow(TEXT_SHADOW);
                pass.clip(&square(0., 0., 10., 10.));
                pass.fill(&square(0., 0., 40., 40.), &Paint::Solid(Color::WHITE))
            })?;
            compositor.pass("opaque", |pass| {
                pass.fill(&square(20., 20., 40., 40.), &Paint::Solid(BLUE))
            })?;
            assert_eq!(compositor.passes(), 2);
            Ok(())
        })
        .unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();

        // Neither the clip nor the alpha of the first pass apply
        assert_eq!(image.get_pixel(30, 30), &Rgba([0, 0, 0xff, 0xff]));
        // Nor its shadow, which would spill left and below the square
        assert_eq!(image.get_pixel(12, 34)[3], 0);
        // The first pass stayed in its own clip
        assert_eq!(image.get_pixel(15, 5)[3], 0);
    }

    #[test]
    fn failed_pass_still_restores() {
        let png = render_to_png(40, 40, |rc| {
            let mut compositor = Compositor::new(rc);
            let failed = compositor.pass("failing", |pass| {
                pass.clip(&square(0., 0., 10., 10.));
                Err(CardError::EmptyGradient)
            });
            assert!(failed.is_err());
            compositor.pass("opaque", |pass| {
                pass.fill(&square(0., 0., 40., 40.), &Paint::Solid(BLUE))
            })
        })
        .unwrap();
        let image = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(image.get_pixel(30, 30), &Rgba([0, 0, 0xff, 0xff]));
    }
}

use piet_common::{
    kurbo::{Point, Rect},
    Color, FixedLinearGradient, GradientStop,
};
use serde::Deserialize;

use super::compositor::Paint;

/// Alpha of the filled part of a progress bar.
pub const FILL_ALPHA: f64 = 0.65;

/// One point of a bar gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop {
    pub color: Color,
    pub position: f32,
}

/// How the filled part of a bar is painted.
#[derive(Debug, Clone, PartialEq)]
pub enum BarColor {
    Flat(Color),
    /// Stops in ascending position order. They are used as given, never sorted.
    Gradient(Vec<Stop>),
}

/// Unvalidated bar color, as written in a card description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BarColorSpec {
    Flat(String),
    Gradient(Vec<StopSpec>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StopSpec {
    #[serde(alias = "hex")]
    pub color: String,
    pub position: f32,
}

/// Length of the filled part of a track of `track_length` pixels.
///
/// `current` must not exceed `max`. An empty range fills nothing.
pub fn filled_length(current: u64, max: u64, track_length: f64) -> f64 {
    if max == 0 {
        return 0.;
    }
    let percent = current as f64 * 100. / max as f64;
    percent * track_length / 100.
}

/// The paint of the filled region `fill` of a bar drawn on a canvas of `canvas_height`.
///
/// A gradient runs from the canvas origin to `(fill width, canvas_height)`.
pub fn bar_paint(color: &BarColor, fill: Rect, canvas_height: f64) -> Paint {
    match color {
        BarColor::Flat(color) => Paint::Solid(*color),
        BarColor::Gradient(stops) => Paint::Gradient(FixedLinearGradient {
            start: Point::ORIGIN,
            end: Point::new(fill.width(), canvas_height),
            stops: stops
                .iter()
                .map(|stop| GradientStop {
                    pos: stop.position,
                    color: stop.color,
                })
                .collect(),
        }),
    }
}

#[test]
fn test_filled_length() {
    assert_eq!(filled_length(30, 100, 950.), 285.);
    assert_eq!(filled_length(100, 100, 950.), 950.);
    assert_eq!(filled_length(0, 100, 950.), 0.);
    assert_eq!(filled_length(0, 0, 950.), 0.);
}

#[test]
fn test_flat_bar_paint() {
    let white = Color::rgba8(0xff, 0xff, 0xff, 0xff);
    let paint = bar_paint(&BarColor::Flat(white), Rect::new(35., 250., 320., 295.), 320.);
    assert!(matches!(paint, Paint::Solid(c) if c == white));
}

#[test]
fn test_gradient_keeps_stop_order() {
    // Out of order stops are the caller's business: they are passed through untouched.
    let stops = vec![
        Stop {
            color: Color::rgba8(0xff, 0, 0, 0xff),
            position: 0.8,
        },
        Stop {
            color: Color::rgba8(0, 0, 0xff, 0xff),
            position: 0.2,
        },
    ];
    let paint = bar_paint(
        &BarColor::Gradient(stops),
        Rect::new(35., 250., 320., 295.),
        320.,
    );

    let Paint::Gradient(gradient) = paint else {
        panic!("expected a gradient");
    };
    assert_eq!(gradient.start, Point::ORIGIN);
    assert_eq!(gradient.end, Point::new(285., 320.));
    let positions: Vec<f32> = gradient.stops.iter().map(|s| s.pos).collect();
    assert_eq!(positions, vec![0.8, 0.2]);
}

#[test]
fn test_stop_spec_accepts_hex_alias() {
    let spec: BarColorSpec =
        serde_json::from_str(r##"[{"hex": "#ff0000", "position": 0}, {"color": "#00f", "position": 1}]"##)
            .unwrap();
    let BarColorSpec::Gradient(stops) = spec else {
        panic!("expected gradient stops");
    };
    assert_eq!(stops[0].color, "#ff0000");
    assert_eq!(stops[1].position, 1.);
}

use piet_common::kurbo::{BezPath, Ellipse, Point, Rect, Shape};

const ELLIPSE_TOLERANCE: f64 = 0.1;

/// Corner radii of a rounded rectangle, clockwise from the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Radii {
    pub top_left: f64,
    pub top_right: f64,
    pub bottom_right: f64,
    pub bottom_left: f64,
}

impl Radii {
    pub const fn uniform(radius: f64) -> Self {
        Self {
            top_left: radius,
            top_right: radius,
            bottom_right: radius,
            bottom_left: radius,
        }
    }
}

impl From<f64> for Radii {
    fn from(radius: f64) -> Self {
        Self::uniform(radius)
    }
}

/// Closed rounded rectangle: straight edges joined by a quadratic curve at each corner,
/// the control point being the corner itself.
///
/// Radii are not clamped: a radius above half the shorter side makes the corner curves
/// overlap.
pub fn rounded_rect_path(rect: Rect, radii: impl Into<Radii>) -> BezPath {
    let r = radii.into();
    let Rect { x0, y0, x1, y1 } = rect;

    let mut path = BezPath::new();
    path.move_to((x0 + r.top_left, y0));
    path.line_to((x1 - r.top_right, y0));
    path.quad_to((x1, y0), (x1, y0 + r.top_right));
    path.line_to((x1, y1 - r.bottom_right));
    path.quad_to((x1, y1), (x1 - r.bottom_right, y1));
    path.line_to((x0 + r.bottom_left, y1));
    path.quad_to((x0, y1), (x0, y1 - r.bottom_left));
    path.line_to((x0, y0 + r.top_left));
    path.quad_to((x0, y0), (x0 + r.top_left, y0));
    path.close_path();
    path
}

/// Ellipse inscribed in the box at `(x, y)` of the given size. Equal sides give a circle.
pub fn circle_path(x: f64, y: f64, width: f64, height: f64) -> BezPath {
    let center = Point::new(0.5f64.mul_add(width, x), 0.5f64.mul_add(height, y));
    Ellipse::new(center, (0.5 * width, 0.5 * height), 0.).to_path(ELLIPSE_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use piet_common::kurbo::PathEl;

    use super::*;

    #[test]
    fn uniform_radius_rounds_every_corner() {
        let path = rounded_rect_path(Rect::new(0., 0., 100., 50.), 10.);
        let quads = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::QuadTo(..)))
            .count();
        assert_eq!(quads, 4);
        assert_eq!(path.elements().first(), Some(&PathEl::MoveTo(Point::new(10., 0.))));
        assert_eq!(path.elements().last(), Some(&PathEl::ClosePath));
    }

    #[test]
    fn missing_corner_radii_default_to_zero() {
        let radii = Radii {
            top_right: 12.,
            ..Default::default()
        };
        let path = rounded_rect_path(Rect::new(0., 0., 100., 50.), radii);
        let elements = path.elements();
        assert_eq!(elements[0], PathEl::MoveTo(Point::new(0., 0.)));
        assert_eq!(elements[1], PathEl::LineTo(Point::new(88., 0.)));
        assert_eq!(
            elements[2],
            PathEl::QuadTo(Point::new(100., 0.), Point::new(100., 12.))
        );
        assert_eq!(elements[3], PathEl::LineTo(Point::new(100., 50.)));
    }

    #[test]
    fn zero_radius_covers_the_whole_rect() {
        let rect = Rect::new(35., 250., 320., 295.);
        let path = rounded_rect_path(rect, 0.);
        assert!((path.area().abs() - rect.area()).abs() < 1e-9);
    }

    #[test]
    fn circle_is_centered_in_its_box() {
        let path = circle_path(520., 110., 220., 220.);
        let bbox = path.bounding_box();
        assert!((bbox.center().x - 630.).abs() < 0.5);
        assert!((bbox.center().y - 220.).abs() < 0.5);
        assert!((bbox.width() - 220.).abs() < 0.5);
        assert!(path.contains(Point::new(630., 220.)));
        assert!(!path.contains(Point::new(521., 111.)));
    }
}

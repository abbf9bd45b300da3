//! Geometric predicates on [`DVec2`] points.
//!
//! Everything in here is a pure function. Degenerate input never produces `NaN`s:
//! collinear triangles get a zero-radius circumcircle and fall back to their centroid.

use glam::DVec2;

/// Two points closer than this (in squared units) are considered the same point.
pub const EPSILON_SQUARED: f64 = 1e-6;

/// Circumcircle determinants below this fraction of the squared side lengths mark a triangle
/// as degenerate. Relative, so that the test does not depend on the scale of the map.
pub(crate) const DETERMINANT_TOLERANCE: f64 = 1e-12;

/// Relative slack of the strict in-circle test. Keeps cocircular points from flipping
/// between "inside" and "outside" due to rounding.
pub(crate) const IN_CIRCLE_TOLERANCE: f64 = 1e-10;

/// Twice the signed area of the triangle `a`, `b`, `c`.
///
/// Positive if the triangle winds counter-clockwise, i.e. `c` lies to the left of the ray `a -> b`.
/// Negative if clockwise, zero if the points are collinear.
#[inline]
pub fn signed_area2(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Returns `true` if `a` and `b` are within [`EPSILON_SQUARED`] of each other.
#[inline]
pub fn approx_eq(a: DVec2, b: DVec2) -> bool {
    approx_eq_with(a, b, EPSILON_SQUARED)
}

#[inline]
pub(crate) fn approx_eq_with(a: DVec2, b: DVec2, epsilon_squared: f64) -> bool {
    a.distance_squared(b) < epsilon_squared
}

/// Barycentric sign test. Points exactly on an edge count as contained.
#[inline]
pub fn point_in_triangle(point: DVec2, [a, b, c]: [DVec2; 3]) -> bool {
    let d1 = signed_area2(a, b, point);
    let d2 = signed_area2(b, c, point);
    let d3 = signed_area2(c, a, point);

    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_negative && has_positive)
}

/// Squared distance from `point` to the closest point of the segment `a`-`b`.
pub fn distance_squared_to_segment(point: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let length_squared = ab.length_squared();
    if length_squared <= 0.0 {
        return point.distance_squared(a);
    }
    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    point.distance_squared(a + ab * t)
}

/// Returns the centroid of the three points.
#[inline]
pub fn centroid([a, b, c]: [DVec2; 3]) -> DVec2 {
    (a + b + c) / 3.0
}

/// The center of the inscribed circle, i.e. the vertices weighted by the length of the opposite side.
///
/// Falls back to the centroid if the triangle has no perimeter to speak of.
pub fn incenter([a, b, c]: [DVec2; 3]) -> DVec2 {
    let side_a = b.distance(c);
    let side_b = c.distance(a);
    let side_c = a.distance(b);
    let perimeter = side_a + side_b + side_c;
    if perimeter <= f64::EPSILON {
        return centroid([a, b, c]);
    }
    (a * side_a + b * side_b + c * side_c) / perimeter
}

/// A circle, usually the circumcircle of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Circle {
    /// The center of the circle.
    pub center: DVec2,
    /// The radius of the circle. Zero for the circumcircle of a degenerate triangle.
    pub radius: f64,
}

impl Circle {
    /// Computes the circle passing through all three points.
    ///
    /// If the points are (nearly) collinear or coincide, the circle is degenerate:
    /// its radius is zero and its center is the centroid of the points.
    pub fn circumscribing([a, b, c]: [DVec2; 3]) -> Self {
        // Work relative to `a` to keep the squared terms small.
        let ab = b - a;
        let ac = c - a;
        let ab_len_sq = ab.length_squared();
        let ac_len_sq = ac.length_squared();
        let determinant = 2.0 * ab.perp_dot(ac);
        if determinant.abs() <= DETERMINANT_TOLERANCE * (ab_len_sq + ac_len_sq) {
            return Self {
                center: centroid([a, b, c]),
                radius: 0.0,
            };
        }
        let offset = DVec2::new(
            (ac.y * ab_len_sq - ab.y * ac_len_sq) / determinant,
            (ab.x * ac_len_sq - ac.x * ab_len_sq) / determinant,
        );
        Self {
            center: a + offset,
            radius: offset.length(),
        }
    }

    /// Returns `true` if the circle is degenerate, i.e. has no area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.radius <= 0.0
    }

    /// Returns `true` if `point` lies strictly inside the circle.
    /// Points on the circle itself are outside. A degenerate circle contains nothing.
    #[inline]
    pub fn contains_strict(&self, point: DVec2) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let radius_squared = self.radius * self.radius;
        let distance_squared = self.center.distance_squared(point);
        radius_squared - distance_squared > radius_squared * IN_CIRCLE_TOLERANCE
    }
}

/// A 2D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2d {
    /// The minimum corner.
    pub min: DVec2,
    /// The maximum corner.
    pub max: DVec2,
}

impl Aabb2d {
    /// Creates a new AABB from two corners.
    pub fn new(min: impl Into<DVec2>, max: impl Into<DVec2>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Computes the AABB of the points.
    /// Returns `None` if there are no points.
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), point| {
            (min.min(point), max.max(point))
        });
        Some(Self { min, max })
    }

    /// The center of the box.
    #[inline]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// The extent of the box along each axis.
    #[inline]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    /// Returns `true` if the point is inside the box or on its border.
    #[inline]
    pub fn contains(&self, point: DVec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Grows the box so that it also contains `other`.
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Length of the polyline through all points.
pub fn polyline_length(points: &[DVec2]) -> f64 {
    points.windows(2).map(|pair| pair[0].distance(pair[1])).sum()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn signed_area_is_positive_for_counter_clockwise() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(1.0, 0.0);
        let c = DVec2::new(0.0, 1.0);
        assert_relative_eq!(signed_area2(a, b, c), 1.0);
        assert_relative_eq!(signed_area2(a, c, b), -1.0);
        assert_relative_eq!(signed_area2(a, b, DVec2::new(2.0, 0.0)), 0.0);
    }

    #[test]
    fn point_in_triangle_includes_edges() {
        let triangle = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(0.0, 4.0),
        ];
        assert!(point_in_triangle(DVec2::new(1.0, 1.0), triangle));
        assert!(point_in_triangle(DVec2::new(2.0, 0.0), triangle));
        assert!(point_in_triangle(DVec2::new(2.0, 2.0), triangle));
        assert!(point_in_triangle(DVec2::new(0.0, 0.0), triangle));
        assert!(!point_in_triangle(DVec2::new(3.0, 3.0), triangle));
        assert!(!point_in_triangle(DVec2::new(-0.1, 1.0), triangle));
    }

    #[test]
    fn point_in_triangle_ignores_winding() {
        let triangle = [
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 4.0),
            DVec2::new(4.0, 0.0),
        ];
        assert!(point_in_triangle(DVec2::new(1.0, 1.0), triangle));
        assert!(!point_in_triangle(DVec2::new(5.0, 1.0), triangle));
    }

    #[test]
    fn can_compute_circumcircle_of_right_triangle() {
        // The hypotenuse of a right triangle is a diameter of its circumcircle.
        let circle = Circle::circumscribing([
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(0.0, 4.0),
        ]);
        assert_relative_eq!(circle.center.x, 2.0);
        assert_relative_eq!(circle.center.y, 2.0);
        assert_relative_eq!(circle.radius, 8.0_f64.sqrt());
        assert!(circle.contains_strict(DVec2::new(1.0, 1.0)));
        assert!(!circle.contains_strict(DVec2::new(4.0, 4.0)));
        assert!(!circle.contains_strict(DVec2::new(10.0, 10.0)));
    }

    #[test]
    fn collinear_triangle_has_degenerate_circumcircle() {
        let circle = Circle::circumscribing([
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 2.0),
        ]);
        assert!(circle.is_degenerate());
        assert!(circle.center.is_finite());
        assert_relative_eq!(circle.center.x, 1.0);
        assert!(!circle.contains_strict(DVec2::new(1.0, 1.0)));
    }

    #[test]
    fn circumcircle_does_not_depend_on_scale() {
        for scale in [1e-7, 1e-3, 1.0, 1e5] {
            let circle = Circle::circumscribing([
                DVec2::new(0.0, 0.0),
                DVec2::new(4.0 * scale, 0.0),
                DVec2::new(0.0, 4.0 * scale),
            ]);
            assert!(!circle.is_degenerate(), "degenerate at scale {scale}");
            assert_relative_eq!(circle.radius, 8.0_f64.sqrt() * scale, max_relative = 1e-9);
        }
        let coincident = Circle::circumscribing([DVec2::new(1e-9, 1e-9); 3]);
        assert!(coincident.is_degenerate());
        assert!(coincident.center.is_finite());
    }

    #[test]
    fn can_measure_distance_to_segment() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(4.0, 0.0);
        assert_relative_eq!(distance_squared_to_segment(DVec2::new(2.0, 3.0), a, b), 9.0);
        assert_relative_eq!(distance_squared_to_segment(DVec2::new(2.0, 0.0), a, b), 0.0);
        assert_relative_eq!(distance_squared_to_segment(DVec2::new(7.0, 4.0), a, b), 25.0);
        assert_relative_eq!(distance_squared_to_segment(DVec2::new(0.0, 2.0), a, a), 4.0);
    }

    #[test]
    fn incenter_of_equilateral_triangle_is_centroid() {
        let triangle = [
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(1.0, 3.0_f64.sqrt()),
        ];
        let incenter = incenter(triangle);
        let centroid = centroid(triangle);
        assert_relative_eq!(incenter.x, centroid.x, epsilon = 1e-12);
        assert_relative_eq!(incenter.y, centroid.y, epsilon = 1e-12);
    }

    #[test]
    fn incenter_of_collapsed_triangle_is_finite() {
        let point = DVec2::new(3.0, -2.0);
        assert_eq!(incenter([point; 3]), point);
    }

    #[test]
    fn aabb_from_points() {
        assert_eq!(Aabb2d::from_points([]), None);
        let aabb = Aabb2d::from_points([
            DVec2::new(1.0, 5.0),
            DVec2::new(-2.0, 3.0),
            DVec2::new(4.0, -1.0),
        ])
        .unwrap();
        assert_eq!(aabb, Aabb2d::new([-2.0, -1.0], [4.0, 5.0]));
        assert_eq!(aabb.center(), DVec2::new(1.0, 2.0));
        assert_eq!(aabb.size(), DVec2::new(6.0, 6.0));
        assert!(aabb.contains(DVec2::new(4.0, 5.0)));
        assert!(!aabb.contains(DVec2::new(4.1, 5.0)));
    }

    #[test]
    fn polyline_length_sums_segments() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(3.0, 4.0),
        ];
        assert_relative_eq!(polyline_length(&points), 7.0);
        assert_relative_eq!(polyline_length(&points[..1]), 0.0);
    }
}

use glam::DVec2;

use crate::{
    Edge,
    math::{self, Circle},
};

/// Three points in a fixed order.
///
/// Edge `i` runs from `vertices[i]` to `vertices[(i + 1) % 3]`.
/// Equality compares the vertex sets, so all permutations of the same three points are equal.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Triangle {
    /// The corners of the triangle.
    pub vertices: [DVec2; 3],
}

impl Triangle {
    /// Creates a triangle from its corners, keeping their order.
    #[inline]
    pub const fn new(a: DVec2, b: DVec2, c: DVec2) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Returns the same triangle wound counter-clockwise.
    /// Collinear triangles are returned unchanged.
    #[inline]
    pub fn counter_clockwise(self) -> Self {
        let [a, b, c] = self.vertices;
        if math::signed_area2(a, b, c) < 0.0 {
            Self::new(a, c, b)
        } else {
            self
        }
    }

    /// The three edges, where edge `i` starts at vertex `i`.
    #[inline]
    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.vertices;
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// Edge `i`, starting at vertex `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[inline]
    pub fn edge(&self, i: usize) -> Edge {
        Edge::new(self.vertices[i], self.vertices[(i + 1) % 3])
    }

    /// Returns `true` if `point` is exactly one of the corners.
    #[inline]
    pub fn has_vertex(&self, point: DVec2) -> bool {
        self.vertices.contains(&point)
    }

    /// Returns `true` if the two triangles have any corner in common.
    #[inline]
    pub fn shares_vertex_with(&self, other: &Triangle) -> bool {
        self.vertices.iter().any(|vertex| other.has_vertex(*vertex))
    }

    /// Returns the edge both triangles have in common, if any.
    /// The edge is oriented as it appears in `self`.
    pub fn shared_edge(&self, other: &Triangle) -> Option<Edge> {
        let other_edges = other.edges();
        self.edges()
            .into_iter()
            .find(|edge| other_edges.contains(edge))
    }

    /// Twice the signed area. Positive for counter-clockwise winding.
    #[inline]
    pub fn signed_area2(&self) -> f64 {
        let [a, b, c] = self.vertices;
        math::signed_area2(a, b, c)
    }

    /// Returns `true` if the triangle has (almost) no area.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.circumcircle().is_degenerate()
    }

    /// Returns `true` if `point` is inside the triangle or on one of its edges.
    #[inline]
    pub fn contains_point(&self, point: DVec2) -> bool {
        math::point_in_triangle(point, self.vertices)
    }

    /// The circle through all three corners.
    #[inline]
    pub fn circumcircle(&self) -> Circle {
        Circle::circumscribing(self.vertices)
    }

    /// The center of the inscribed circle.
    #[inline]
    pub fn incenter(&self) -> DVec2 {
        math::incenter(self.vertices)
    }

    /// The average of the three corners.
    #[inline]
    pub fn centroid(&self) -> DVec2 {
        math::centroid(self.vertices)
    }
}

impl PartialEq for Triangle {
    fn eq(&self, other: &Self) -> bool {
        self.vertices.iter().all(|vertex| other.has_vertex(*vertex))
            && other.vertices.iter().all(|vertex| self.has_vertex(*vertex))
    }
}

impl From<[DVec2; 3]> for Triangle {
    fn from(vertices: [DVec2; 3]) -> Self {
        Self { vertices }
    }
}

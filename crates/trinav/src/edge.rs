use glam::DVec2;

/// An unordered pair of points.
///
/// Two edges are equal if their endpoints match, regardless of order.
/// Comparison is exact: the triangulator relies on bit-identical vertices to find shared edges.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// The first endpoint.
    pub a: DVec2,
    /// The second endpoint.
    pub b: DVec2,
}

impl Edge {
    /// Creates a new edge between `a` and `b`.
    #[inline]
    pub const fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    /// Returns `true` if `point` is one of the endpoints.
    #[inline]
    pub fn has_endpoint(&self, point: DVec2) -> bool {
        self.a == point || self.b == point
    }

    /// The point halfway between both endpoints.
    #[inline]
    pub fn midpoint(&self) -> DVec2 {
        (self.a + self.b) * 0.5
    }

    /// The length of the edge.
    #[inline]
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// The same edge with its endpoints swapped.
    #[inline]
    pub const fn reversed(self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }

    /// An order-independent key built from the bit patterns of both endpoints.
    pub(crate) fn key(&self) -> EdgeKey {
        let a = point_bits(self.a);
        let b = point_bits(self.b);
        if a <= b { (a, b) } else { (b, a) }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

pub(crate) type EdgeKey = ((u64, u64), (u64, u64));

#[inline]
fn point_bits(point: DVec2) -> (u64, u64) {
    (point.x.to_bits(), point.y.to_bits())
}

//! Incremental Delaunay triangulation after Bowyer and Watson.
//!
//! Every input point is inserted into a working set of triangles that initially only holds a
//! super-triangle enclosing all points. Inserting a point removes every triangle whose circumcircle
//! strictly contains it and fills the resulting cavity with a fan around the point.
//! Finally, everything touching the super-triangle is discarded.
//!
//! The output only depends on the input points and their order, which makes rebuilding a
//! [`NavMesh`](crate::NavMesh) from stored points reproduce the same triangle indices.

use glam::DVec2;
use slotmap::SlotMap;

use crate::{
    Edge, NavMeshConfig, Triangle,
    math::{Aabb2d, Circle},
};

slotmap::new_key_type! {
    /// Key of a triangle in the working set of the [`Triangulator`].
    struct WorkingTriangleKey;
}

/// Triangulates `points` with the default [`NavMeshConfig`].
/// See [`Triangulator::triangulate`].
pub fn triangulate(points: &[DVec2]) -> Vec<Triangle> {
    Triangulator::default().triangulate(points)
}

/// Builds Delaunay triangulations of point sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulator {
    /// See [`NavMeshConfig::super_triangle_margin`].
    pub super_triangle_margin: f64,
}

impl Default for Triangulator {
    fn default() -> Self {
        Self::from(&NavMeshConfig::default())
    }
}

impl From<&NavMeshConfig> for Triangulator {
    fn from(config: &NavMeshConfig) -> Self {
        Self {
            super_triangle_margin: config.super_triangle_margin,
        }
    }
}

/// A triangle of the working set, with its circumcircle cached.
struct WorkingTriangle {
    triangle: Triangle,
    circumcircle: Circle,
}

impl From<Triangle> for WorkingTriangle {
    fn from(triangle: Triangle) -> Self {
        Self {
            circumcircle: triangle.circumcircle(),
            triangle,
        }
    }
}

impl Triangulator {
    /// Computes the Delaunay triangulation of `points`.
    ///
    /// The returned triangles are wound counter-clockwise and come in a deterministic order.
    /// No input point lies strictly inside the circumcircle of any returned triangle.
    ///
    /// Degenerate input never fails: fewer than three points, duplicates, or collinear point sets
    /// simply produce fewer (possibly zero) triangles. Degenerate triangles are never returned.
    pub fn triangulate(&self, points: &[DVec2]) -> Vec<Triangle> {
        if points.len() < 3 {
            tracing::debug!(
                "Not enough points to triangulate ({} points)",
                points.len()
            );
            return Vec::new();
        }
        let Some(aabb) = Aabb2d::from_points(points.iter().copied()) else {
            return Vec::new();
        };
        let super_triangle = self.super_triangle(aabb);

        let mut triangles: SlotMap<WorkingTriangleKey, WorkingTriangle> =
            SlotMap::with_capacity_and_key(points.len() * 2 + 1);
        triangles.insert(super_triangle.into());

        let mut bad_triangles = Vec::new();
        let mut boundary = Vec::new();
        for &point in points {
            if !point.is_finite() {
                tracing::warn!("Skipping non-finite point {point}");
                continue;
            }
            bad_triangles.clear();
            bad_triangles.extend(
                triangles
                    .iter()
                    .filter(|(_, working)| working.circumcircle.contains_strict(point))
                    .map(|(key, _)| key),
            );

            collect_cavity_boundary(&triangles, &bad_triangles, &mut boundary);

            for key in &bad_triangles {
                triangles.remove(*key);
            }
            for edge in &boundary {
                let triangle = Triangle::new(edge.a, edge.b, point).counter_clockwise();
                triangles.insert(triangle.into());
            }
        }

        let mut degenerate_count = 0;
        let result: Vec<_> = triangles
            .into_iter()
            .map(|(_, working)| working)
            .filter(|working| !working.triangle.shares_vertex_with(&super_triangle))
            .filter(|working| {
                let degenerate = working.circumcircle.is_degenerate();
                degenerate_count += degenerate as usize;
                !degenerate
            })
            .map(|working| working.triangle)
            .collect();

        if degenerate_count > 0 {
            tracing::debug!("Discarded {degenerate_count} degenerate triangles");
        }
        tracing::debug!(
            "Triangulated {} points into {} triangles",
            points.len(),
            result.len()
        );
        result
    }

    /// An equilateral triangle whose inscribed circle is centered on the AABB
    /// and whose inradius is [`Self::super_triangle_margin`] times the AABB's largest side.
    fn super_triangle(&self, aabb: Aabb2d) -> Triangle {
        let center = aabb.center();
        let extent = match aabb.size().max_element() {
            extent if extent > 0.0 => extent,
            // All points coincide, any size will do.
            _ => 1.0,
        };
        let radius = extent * self.super_triangle_margin.max(1.0);
        let sqrt_3 = 3.0_f64.sqrt();
        Triangle::new(
            DVec2::new(center.x - sqrt_3 * radius, center.y - radius),
            DVec2::new(center.x + sqrt_3 * radius, center.y - radius),
            DVec2::new(center.x, center.y + 2.0 * radius),
        )
    }
}

/// Collects every edge that belongs to exactly one bad triangle, in first-seen order.
/// Edges shared by two bad triangles lie inside the cavity and are dropped.
fn collect_cavity_boundary(
    triangles: &SlotMap<WorkingTriangleKey, WorkingTriangle>,
    bad_triangles: &[WorkingTriangleKey],
    boundary: &mut Vec<Edge>,
) {
    boundary.clear();
    let mut counts: Vec<(Edge, u32)> = Vec::with_capacity(bad_triangles.len() * 3);
    for key in bad_triangles {
        for edge in triangles[*key].triangle.edges() {
            if let Some((_, count)) = counts.iter_mut().find(|(known, _)| *known == edge) {
                *count += 1;
            } else {
                counts.push((edge, 1));
            }
        }
    }
    boundary.extend(
        counts
            .into_iter()
            .filter(|(_, count)| *count == 1)
            .map(|(edge, _)| edge),
    );
}

#[cfg(feature = "bevy_reflect")]
use bevy_reflect::prelude::*;

use crate::math::EPSILON_SQUARED;

/// Specifies a configuration to use when building a [`NavMesh`](crate::NavMesh) and querying paths on it.
/// Usually built using [`NavMeshConfigBuilder`].
///
/// The defaults work for play areas of any scale, since the only length-dependent value,
/// [`Self::funnel_epsilon`], is tiny compared to sensible map units.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(
    all(feature = "serialize", feature = "bevy_reflect"),
    reflect(Serialize, Deserialize)
)]
pub struct NavMeshConfig {
    /// How far the super-triangle extends past the input, as a multiple of the largest side of
    /// the input's bounding box. `[Limit: > 0]`
    ///
    /// The super-triangle seeds the Delaunay triangulation and is removed at the end.
    /// If it is too small, triangles along the convex hull of the input go missing,
    /// because their circumcircles interact with the super-triangle's corners.
    /// Larger values cost nothing but floating point precision.
    pub super_triangle_margin: f64,

    /// The point of each triangle that edge costs and the search heuristic are measured between.
    pub path_anchor: PathAnchor,

    /// Two waypoints closer than this squared distance are considered the same point by the funnel.
    /// `[Limit: > 0] [Units: wu²]`
    ///
    /// Guards the funnel against oscillating on duplicate or degenerate portal vertices.
    /// This is the only absolute length in the pipeline; triangulation tolerances are relative.
    /// Lower it for maps whose features are smaller than about `1e-3` world units apart.
    pub funnel_epsilon: f64,
}

impl Default for NavMeshConfig {
    fn default() -> Self {
        NavMeshConfigBuilder::default().build()
    }
}

/// Which point of a triangle is used as the node position during the A* search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(
    all(feature = "serialize", feature = "bevy_reflect"),
    reflect(Serialize, Deserialize)
)]
pub enum PathAnchor {
    /// The center of the circumcircle.
    ///
    /// This is not guaranteed to produce an admissible heuristic: the circumcenter of an obtuse triangle
    /// lies outside of it. It is the accepted practical choice for navmesh search nonetheless.
    #[default]
    Circumcenter,
    /// The center of the inscribed circle. Always inside the triangle.
    Incenter,
}

/// A builder for [`NavMeshConfig`].
/// Invalid values are replaced by their defaults when building.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(
    all(feature = "serialize", feature = "bevy_reflect"),
    reflect(Serialize, Deserialize)
)]
pub struct NavMeshConfigBuilder {
    /// See [`NavMeshConfig::super_triangle_margin`].
    pub super_triangle_margin: f64,
    /// See [`NavMeshConfig::path_anchor`].
    pub path_anchor: PathAnchor,
    /// See [`NavMeshConfig::funnel_epsilon`].
    pub funnel_epsilon: f64,
}

impl Default for NavMeshConfigBuilder {
    fn default() -> Self {
        Self {
            super_triangle_margin: Self::DEFAULT_SUPER_TRIANGLE_MARGIN,
            path_anchor: PathAnchor::default(),
            funnel_epsilon: EPSILON_SQUARED,
        }
    }
}

impl NavMeshConfigBuilder {
    const DEFAULT_SUPER_TRIANGLE_MARGIN: f64 = 20.0;

    /// Sets [`NavMeshConfig::super_triangle_margin`].
    pub fn with_super_triangle_margin(mut self, margin: f64) -> Self {
        self.super_triangle_margin = margin;
        self
    }

    /// Sets [`NavMeshConfig::path_anchor`].
    pub fn with_path_anchor(mut self, anchor: PathAnchor) -> Self {
        self.path_anchor = anchor;
        self
    }

    /// Sets [`NavMeshConfig::funnel_epsilon`].
    pub fn with_funnel_epsilon(mut self, epsilon: f64) -> Self {
        self.funnel_epsilon = epsilon;
        self
    }

    /// Builds a [`NavMeshConfig`] from the current configuration.
    pub fn build(self) -> NavMeshConfig {
        NavMeshConfig {
            super_triangle_margin: positive_or(
                self.super_triangle_margin,
                Self::DEFAULT_SUPER_TRIANGLE_MARGIN,
            ),
            path_anchor: self.path_anchor,
            funnel_epsilon: positive_or(self.funnel_epsilon, EPSILON_SQUARED),
        }
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        tracing::warn!("Invalid config value {value}, falling back to {fallback}");
        fallback
    }
}

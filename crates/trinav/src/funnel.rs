//! Turns a [`Route`](crate::Route) into waypoints with the funnel algorithm, also known as string pulling.
//!
//! The route's consecutive triangles share one edge each, the portals the path has to cross.
//! The funnel keeps an apex and the two rays from it to the left and right side of the portals
//! seen so far, narrowing them portal by portal. Once one side crosses over the other,
//! the crossed-over corner becomes a waypoint and the new apex, and the scan restarts there.
//! The result is the shortest path that stays inside the corridor of triangles.

use glam::DVec2;

use crate::{
    Edge, NavMesh, TriangleIndex,
    math::{self, EPSILON_SQUARED, signed_area2},
};

/// The edge shared by two consecutive triangles of a route, oriented relative to the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Portal {
    /// The endpoint on the left hand side when crossing the portal.
    pub left: DVec2,
    /// The endpoint on the right hand side when crossing the portal.
    pub right: DVec2,
}

impl Portal {
    /// A portal of zero width at `point`.
    #[inline]
    pub const fn point(point: DVec2) -> Self {
        Self {
            left: point,
            right: point,
        }
    }

    /// The point halfway between both sides.
    #[inline]
    pub fn midpoint(&self) -> DVec2 {
        (self.left + self.right) * 0.5
    }
}

impl From<Portal> for Edge {
    fn from(portal: Portal) -> Self {
        Edge::new(portal.left, portal.right)
    }
}

impl NavMesh {
    /// Returns the portals between consecutive triangles of `route`.
    ///
    /// Pairs of triangles that are not adjacent are skipped with a warning, so the result of
    /// a route found by [`NavMesh::find_route`] always has exactly one portal less than triangles.
    pub fn extract_portals(&self, route: &[TriangleIndex]) -> Vec<Portal> {
        let mut portals = Vec::with_capacity(route.len().saturating_sub(1));
        for pair in route.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let Some(node) = self.node(from) else {
                tracing::warn!("Route contains unknown triangle {from}");
                continue;
            };
            let Some(edge_index) = node.edge_towards(to) else {
                tracing::warn!("Triangles {from} and {to} of route are not adjacent");
                continue;
            };
            // Nodes are wound counter-clockwise, so the interior of `from` lies to the left of its
            // edges. Leaving through an edge means facing away from the interior, which puts the
            // end of the edge on our left.
            let edge = node.triangle.edge(edge_index);
            portals.push(Portal {
                left: edge.b,
                right: edge.a,
            });
        }
        portals
    }
}

/// Pulls a string from `start` through all `portals` to `end`, with the default epsilon.
/// See [`string_pull_with_epsilon`].
pub fn string_pull(start: DVec2, portals: &[Portal], end: DVec2) -> Vec<DVec2> {
    string_pull_with_epsilon(start, portals, end, EPSILON_SQUARED)
}

/// Pulls a string from `start` through all `portals` to `end`.
///
/// The returned waypoints start with `start` and end with `end`. In between are the portal
/// corners the path has to bend around. Two consecutive waypoints are never closer than
/// `epsilon_squared`, unless `start` and `end` themselves are.
pub fn string_pull_with_epsilon(
    start: DVec2,
    portals: &[Portal],
    end: DVec2,
    epsilon_squared: f64,
) -> Vec<DVec2> {
    let same = |a: DVec2, b: DVec2| math::approx_eq_with(a, b, epsilon_squared);

    let mut path = vec![start];
    if same(start, end) {
        path.push(end);
        return path;
    }

    // A start on a portal, e.g. on the edge between its triangle and the next, would put that
    // portal's endpoints on opposite sides of the apex. Such portals don't narrow the funnel.
    let passed = portals
        .iter()
        .take_while(|portal| {
            math::distance_squared_to_segment(start, portal.left, portal.right) < epsilon_squared
        })
        .count();
    let portals: Vec<Portal> = std::iter::once(Portal::point(start))
        .chain(portals[passed..].iter().copied())
        .chain(std::iter::once(Portal::point(end)))
        .collect();

    let mut apex = start;
    let mut left = start;
    let mut right = start;
    let mut left_index = 0;
    let mut right_index = 0;

    let mut i = 1;
    while i < portals.len() {
        let portal = portals[i];

        // Tighten the right side, unless the new right point widens the funnel.
        if same(apex, right) || signed_area2(apex, right, portal.right) >= 0.0 {
            if same(apex, right) || signed_area2(apex, left, portal.right) < 0.0 {
                right = portal.right;
                right_index = i;
            } else {
                // Right crossed over left: the left corner is a waypoint.
                if !path.last().is_some_and(|last| same(*last, left)) {
                    path.push(left);
                }
                apex = left;
                right = apex;
                right_index = left_index;
                i = left_index + 1;
                continue;
            }
        }

        // Tighten the left side, unless the new left point widens the funnel.
        if same(apex, left) || signed_area2(apex, left, portal.left) <= 0.0 {
            if same(apex, left) || signed_area2(apex, right, portal.left) > 0.0 {
                left = portal.left;
                left_index = i;
            } else {
                // Left crossed over right: the right corner is a waypoint.
                if !path.last().is_some_and(|last| same(*last, right)) {
                    path.push(right);
                }
                apex = right;
                left = apex;
                left_index = right_index;
                i = right_index + 1;
                continue;
            }
        }

        i += 1;
    }

    if path.len() > 1 && path.last().is_some_and(|last| same(*last, end)) {
        path.pop();
    }
    path.push(end);
    path
}

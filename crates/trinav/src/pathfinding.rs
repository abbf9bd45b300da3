//! A* search over the triangle adjacency graph of a [`NavMesh`].
//!
//! Search state lives in a table owned by a single call and indexed by [`TriangleIndex`].
//! Nothing is written to the mesh, so searches never see scores left over from earlier ones.

use std::{cmp::Ordering, collections::BinaryHeap};

use glam::DVec2;
use thiserror::Error;

use crate::{NavMesh, PathAnchor, TriangleIndex, TriangleNode};

/// A coarse route through the mesh: the triangles to walk through, from start to end.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// The triangles along the route. The first one contains the start, the last one the end.
    pub triangles: Vec<TriangleIndex>,
    /// The accumulated anchor-to-anchor distance along the route.
    pub cost: f64,
}

impl Route {
    /// Returns `true` if there is no route.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The number of triangles along the route.
    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }
}

/// Reasons why no route exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    /// The start point is outside the mesh or in a gap.
    #[error("Start point {0} is not inside the navmesh")]
    StartNotInMesh(DVec2),
    /// The end point is outside the mesh or in a gap.
    #[error("End point {0} is not inside the navmesh")]
    EndNotInMesh(DVec2),
    /// The start point lies in a blocked triangle.
    #[error("Start point lies in blocked triangle {0}")]
    StartBlocked(TriangleIndex),
    /// The end point lies in a blocked triangle.
    #[error("End point lies in blocked triangle {0}")]
    EndBlocked(TriangleIndex),
    /// Every path between start and end is cut off by blocked triangles or mesh gaps.
    #[error("Triangle {end} is unreachable from triangle {start}")]
    Unreachable {
        /// The triangle containing the start point.
        start: TriangleIndex,
        /// The triangle containing the end point.
        end: TriangleIndex,
    },
}

/// Per-search scores of one triangle.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    /// Cost from the start.
    g: f64,
    /// Estimated cost to the goal.
    h: f64,
    parent: Option<TriangleIndex>,
    closed: bool,
}

impl SearchNode {
    #[inline]
    fn f(&self) -> f64 {
        self.g + self.h
    }
}

/// An entry of the open set. Ordered so that [`BinaryHeap`] pops the lowest `f` first,
/// breaking ties by lower `h`, then by lower index.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    h: f64,
    g: f64,
    index: TriangleIndex,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed, since `BinaryHeap` is a max-heap.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.h.total_cmp(&self.h))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl NavMesh {
    /// Finds the cheapest sequence of walkable triangles leading from `start` to `end`.
    ///
    /// Returns an empty [`Route`] if there is none. See [`Self::try_find_route`] for the reason.
    pub fn find_route(&self, start: DVec2, end: DVec2) -> Route {
        match self.try_find_route(start, end) {
            Ok(route) => route,
            Err(err) => {
                tracing::debug!("No route: {err}");
                Route::default()
            }
        }
    }

    /// Finds the cheapest sequence of walkable triangles leading from `start` to `end`.
    ///
    /// Edge costs and the heuristic are distances between the triangles' anchors,
    /// see [`NavMeshConfig::path_anchor`](crate::NavMeshConfig::path_anchor).
    /// Blocked triangles are never part of a route.
    pub fn try_find_route(&self, start: DVec2, end: DVec2) -> Result<Route, RouteError> {
        let start_node = self
            .locate(start)
            .ok_or(RouteError::StartNotInMesh(start))?;
        let end_node = self.locate(end).ok_or(RouteError::EndNotInMesh(end))?;
        if start_node.blocked {
            return Err(RouteError::StartBlocked(start_node.index));
        }
        if end_node.blocked {
            return Err(RouteError::EndBlocked(end_node.index));
        }
        if start_node.index == end_node.index {
            return Ok(Route {
                triangles: vec![start_node.index],
                cost: 0.0,
            });
        }
        self.a_star(start_node, end_node, self.config().path_anchor)
    }

    fn a_star(
        &self,
        start: &TriangleNode,
        end: &TriangleNode,
        anchor: PathAnchor,
    ) -> Result<Route, RouteError> {
        let goal = end.anchor(anchor);
        let mut scratch: Vec<Option<SearchNode>> = vec![None; self.len()];
        let mut open = BinaryHeap::new();

        let start_h = start.anchor(anchor).distance(goal);
        scratch[start.index.as_usize()] = Some(SearchNode {
            g: 0.0,
            h: start_h,
            parent: None,
            closed: false,
        });
        open.push(OpenEntry {
            f: start_h,
            h: start_h,
            g: 0.0,
            index: start.index,
        });

        let mut expanded = 0_usize;
        while let Some(entry) = open.pop() {
            let Some(current) = scratch[entry.index.as_usize()].as_mut() else {
                continue;
            };
            // Skip entries superseded by a cheaper path to the same triangle.
            if current.closed || entry.g > current.g {
                continue;
            }
            current.closed = true;
            let current_g = current.g;
            expanded += 1;

            if entry.index == end.index {
                tracing::trace!("Reached triangle {} after expanding {expanded} triangles", end.index);
                return Ok(Route {
                    triangles: self.reconstruct(&scratch, start.index, end.index),
                    cost: current_g,
                });
            }

            let Some(current_node) = self.node(entry.index) else {
                continue;
            };
            let current_position = current_node.anchor(anchor);
            for neighbor_index in current_node.neighbors() {
                let Some(neighbor) = self.node(neighbor_index) else {
                    continue;
                };
                if neighbor.blocked {
                    continue;
                }
                let slot = &mut scratch[neighbor_index.as_usize()];
                if slot.is_some_and(|node| node.closed) {
                    continue;
                }
                let neighbor_position = neighbor.anchor(anchor);
                let g = current_g + current_position.distance(neighbor_position);
                if slot.is_some_and(|node| g >= node.g) {
                    continue;
                }
                let node = SearchNode {
                    g,
                    h: neighbor_position.distance(goal),
                    parent: Some(entry.index),
                    closed: false,
                };
                *slot = Some(node);
                open.push(OpenEntry {
                    f: node.f(),
                    h: node.h,
                    g,
                    index: neighbor_index,
                });
            }
        }

        tracing::trace!("Search exhausted after expanding {expanded} triangles");
        Err(RouteError::Unreachable {
            start: start.index,
            end: end.index,
        })
    }

    /// Follows parent links back from `end` and returns the route in start-to-end order.
    fn reconstruct(
        &self,
        scratch: &[Option<SearchNode>],
        start: TriangleIndex,
        end: TriangleIndex,
    ) -> Vec<TriangleIndex> {
        let mut route = vec![end];
        let mut current = end;
        // A parent chain can never be longer than the mesh.
        while current != start && route.len() <= self.len() {
            let Some(parent) = scratch[current.as_usize()].and_then(|node| node.parent) else {
                tracing::warn!("Broken parent chain at triangle {current}");
                break;
            };
            route.push(parent);
            current = parent;
        }
        route.reverse();
        route
    }
}

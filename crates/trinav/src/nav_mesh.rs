//! The [`NavMesh`] owns the triangles of one play area and the graph connecting them.

use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
    ops::Deref,
};

#[cfg(feature = "bevy_reflect")]
use bevy_reflect::prelude::*;
use glam::DVec2;
use thiserror::Error;

use crate::{
    NavMeshConfig, PathAnchor, Triangle, Triangulator,
    edge::EdgeKey,
    math::{Aabb2d, Circle},
};

/// Stable index of a triangle in a [`NavMesh`].
///
/// Indices are assigned once when the mesh is built, in the order the triangulator produced the
/// triangles. Rebuilding from the same points in the same order yields the same indices,
/// so they can be used as keys for persisting per-triangle state such as [`TriangleNode::blocked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[repr(transparent)]
pub struct TriangleIndex(pub u32);

impl TriangleIndex {
    /// The index as a `usize`, for indexing into slices.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Deref for TriangleIndex {
    type Target = u32;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u32> for TriangleIndex {
    fn from(value: u32) -> Self {
        TriangleIndex(value)
    }
}

impl fmt::Display for TriangleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A triangle of the [`NavMesh`] together with its derived geometry and graph data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct TriangleNode {
    /// The stable index of this node.
    pub index: TriangleIndex,
    /// The triangle, wound counter-clockwise.
    pub triangle: Triangle,
    /// The circumcircle of [`Self::triangle`].
    pub circumcircle: Circle,
    /// The incenter of [`Self::triangle`].
    pub incenter: DVec2,
    /// Whether agents may walk through this triangle. Set by game rules, unrelated to geometry.
    pub blocked: bool,
    /// `neighbors[i]` is the triangle across edge `i`, see [`Triangle::edge`].
    /// `None` if that edge is on the border of the mesh.
    pub neighbors: [Option<TriangleIndex>; 3],
}

impl TriangleNode {
    fn new(index: TriangleIndex, triangle: Triangle) -> Self {
        Self {
            index,
            circumcircle: triangle.circumcircle(),
            incenter: triangle.incenter(),
            triangle,
            blocked: false,
            neighbors: [None; 3],
        }
    }

    /// The center of the circumcircle.
    #[inline]
    pub fn circumcenter(&self) -> DVec2 {
        self.circumcircle.center
    }

    /// The point used as this node's position during path search.
    #[inline]
    pub fn anchor(&self, anchor: PathAnchor) -> DVec2 {
        match anchor {
            PathAnchor::Circumcenter => self.circumcenter(),
            PathAnchor::Incenter => self.incenter,
        }
    }

    /// Iterates over the indices of all adjacent triangles.
    #[inline]
    pub fn neighbors(&self) -> impl Iterator<Item = TriangleIndex> + '_ {
        self.neighbors.iter().flatten().copied()
    }

    /// Returns the number of edge `other` is adjacent to, if any.
    #[inline]
    pub fn edge_towards(&self, other: TriangleIndex) -> Option<usize> {
        self.neighbors
            .iter()
            .position(|neighbor| *neighbor == Some(other))
    }
}

/// A triangulated walkable surface and the adjacency graph between its triangles.
///
/// Built once per map and shared by all path requests. Queries only borrow the mesh immutably,
/// so any number of searches can run concurrently.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavMesh {
    nodes: Vec<TriangleNode>,
    points: Vec<DVec2>,
    aabb: Option<Aabb2d>,
    config: NavMeshConfig,
}

impl NavMesh {
    /// Triangulates `points` and builds a mesh from the result.
    pub fn from_points(points: &[DVec2], config: &NavMeshConfig) -> Self {
        let triangles = Triangulator::from(config).triangulate(points);
        let mut mesh = Self::build_with_config(triangles, config.clone());
        mesh.points = points.to_vec();
        mesh
    }

    /// Builds a mesh with the default [`NavMeshConfig`] from existing triangles.
    ///
    /// Triangles are indexed in iteration order. Triangles sharing two bit-identical vertices
    /// become neighbors; use [`Self::from_points`] to have that guaranteed by construction.
    pub fn build(triangles: impl IntoIterator<Item = Triangle>) -> Self {
        Self::build_with_config(triangles, NavMeshConfig::default())
    }

    /// Builds a mesh from existing triangles. See [`Self::build`].
    pub fn build_with_config(
        triangles: impl IntoIterator<Item = Triangle>,
        config: NavMeshConfig,
    ) -> Self {
        let nodes: Vec<_> = triangles
            .into_iter()
            .enumerate()
            .map(|(i, triangle)| {
                TriangleNode::new(TriangleIndex(i as u32), triangle.counter_clockwise())
            })
            .collect();
        let aabb = nodes
            .iter()
            .filter_map(|node| Aabb2d::from_points(node.triangle.vertices))
            .reduce(Aabb2d::union);
        let mut mesh = Self {
            nodes,
            points: Vec::new(),
            aabb,
            config,
        };
        mesh.link_neighbors();
        tracing::debug!("Built navmesh with {} triangles", mesh.nodes.len());
        mesh
    }

    /// Replaces the whole mesh with a triangulation of `points`, keeping the config.
    /// All blocked flags are cleared.
    pub fn rebuild(&mut self, points: &[DVec2]) {
        let config = self.config.clone();
        *self = Self::from_points(points, &config);
    }

    /// Registers every pair of triangles with a common edge as each other's neighbors.
    /// Edges of more than two triangles are not linked at all.
    fn link_neighbors(&mut self) {
        // `None` marks an edge that already has two triangles.
        let mut open_edges: HashMap<EdgeKey, Option<(TriangleIndex, usize)>> =
            HashMap::with_capacity(self.nodes.len() * 3 / 2);
        let mut links = HashMap::with_capacity(self.nodes.len() * 3 / 2);
        for node in &self.nodes {
            for (edge_index, edge) in node.triangle.edges().iter().enumerate() {
                let key = edge.key();
                match open_edges.entry(key) {
                    Entry::Occupied(mut entry) => match entry.get_mut().take() {
                        Some(other) => {
                            links.insert(key, ((node.index, edge_index), other));
                        }
                        None => {
                            if let Some(((a, _), (b, _))) = links.remove(&key) {
                                tracing::warn!(
                                    "Edge of triangles {a} and {b} is shared by triangle {} as well, not linking any of them",
                                    node.index
                                );
                            }
                        }
                    },
                    Entry::Vacant(entry) => {
                        entry.insert(Some((node.index, edge_index)));
                    }
                }
            }
        }
        for ((a, a_edge), (b, b_edge)) in links.into_values() {
            self.nodes[a.as_usize()].neighbors[a_edge] = Some(b);
            self.nodes[b.as_usize()].neighbors[b_edge] = Some(a);
        }
    }

    /// Returns the first triangle containing `point`. Points on an edge count as contained.
    ///
    /// This is a linear scan over all triangles.
    pub fn locate(&self, point: DVec2) -> Option<&TriangleNode> {
        if !self.aabb?.contains(point) {
            return None;
        }
        self.nodes
            .iter()
            .find(|node| node.triangle.contains_point(point))
    }

    /// Returns the index of the first triangle containing `point`. See [`Self::locate`].
    #[inline]
    pub fn locate_index(&self, point: DVec2) -> Option<TriangleIndex> {
        self.locate(point).map(|node| node.index)
    }

    /// Marks a triangle as blocked or walkable.
    pub fn set_blocked(&mut self, index: TriangleIndex, blocked: bool) -> Result<(), NavMeshError> {
        let len = self.nodes.len();
        let node = self
            .nodes
            .get_mut(index.as_usize())
            .ok_or(NavMeshError::IndexOutOfBounds { index, len })?;
        node.blocked = blocked;
        Ok(())
    }

    /// Returns whether the triangle is blocked. Unknown indices are not blocked.
    #[inline]
    pub fn is_blocked(&self, index: TriangleIndex) -> bool {
        self.node(index).is_some_and(|node| node.blocked)
    }

    /// Iterates over the blocked state of every triangle, in index order.
    pub fn blocked_flags(&self) -> impl Iterator<Item = (TriangleIndex, bool)> + '_ {
        self.nodes.iter().map(|node| (node.index, node.blocked))
    }

    /// Applies blocked flags, e.g. ones stored by [`Self::blocked_flags`] on an earlier build.
    /// Indices that don't exist in this mesh are skipped.
    /// Returns the number of flags applied.
    pub fn apply_blocked_flags(
        &mut self,
        flags: impl IntoIterator<Item = (TriangleIndex, bool)>,
    ) -> usize {
        let mut applied = 0;
        for (index, blocked) in flags {
            match self.set_blocked(index, blocked) {
                Ok(()) => applied += 1,
                Err(err) => tracing::warn!("Skipping blocked flag: {err}"),
            }
        }
        applied
    }

    /// Returns the node with the given index.
    #[inline]
    pub fn node(&self, index: TriangleIndex) -> Option<&TriangleNode> {
        self.nodes.get(index.as_usize())
    }

    /// All nodes, in index order.
    #[inline]
    pub fn nodes(&self) -> &[TriangleNode] {
        &self.nodes
    }

    /// Iterates over the neighbors of a triangle. Empty for unknown indices.
    pub fn neighbors(&self, index: TriangleIndex) -> impl Iterator<Item = TriangleIndex> + '_ {
        self.node(index).into_iter().flat_map(TriangleNode::neighbors)
    }

    /// The number of triangles.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the mesh has no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The points the mesh was triangulated from, in their original order.
    /// Empty if the mesh was built from triangles directly.
    #[inline]
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// The bounding box of all triangles. `None` for an empty mesh.
    #[inline]
    pub fn aabb(&self) -> Option<Aabb2d> {
        self.aabb
    }

    /// The config the mesh was built with.
    #[inline]
    pub fn config(&self) -> &NavMeshConfig {
        &self.config
    }

    /// Changes the config used by path queries. Does not rebuild the mesh.
    pub fn set_config(&mut self, config: NavMeshConfig) {
        self.config = config;
    }
}

/// Errors of [`NavMesh`] mutators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavMeshError {
    /// The triangle index does not exist in this mesh.
    #[error("Triangle index {index} is out of bounds for a navmesh with {len} triangles")]
    IndexOutOfBounds {
        /// The offending index.
        index: TriangleIndex,
        /// The number of triangles in the mesh.
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two triangles forming the square (0, 0) - (2, 2), split along the diagonal.
    fn two_triangles() -> NavMesh {
        NavMesh::build([
            Triangle::new(
                DVec2::new(0.0, 0.0),
                DVec2::new(2.0, 0.0),
                DVec2::new(0.0, 2.0),
            ),
            Triangle::new(
                DVec2::new(2.0, 0.0),
                DVec2::new(2.0, 2.0),
                DVec2::new(0.0, 2.0),
            ),
        ])
    }

    #[test]
    fn can_build_empty_mesh() {
        let mesh = NavMesh::build([]);
        assert!(mesh.is_empty());
        assert_eq!(mesh.aabb(), None);
        assert_eq!(mesh.locate(DVec2::ZERO), None);
    }

    #[test]
    fn indices_follow_insertion_order() {
        let mesh = two_triangles();
        for (i, node) in mesh.nodes().iter().enumerate() {
            assert_eq!(node.index, TriangleIndex(i as u32));
        }
    }

    #[test]
    fn can_link_neighbors() {
        let mesh = two_triangles();
        let first = mesh.node(TriangleIndex(0)).unwrap();
        let second = mesh.node(TriangleIndex(1)).unwrap();
        assert_eq!(first.neighbors().collect::<Vec<_>>(), vec![TriangleIndex(1)]);
        assert_eq!(second.neighbors().collect::<Vec<_>>(), vec![TriangleIndex(0)]);

        let edge = first.edge_towards(TriangleIndex(1)).unwrap();
        assert_eq!(
            first.triangle.edge(edge),
            first.triangle.shared_edge(&second.triangle).unwrap()
        );
    }

    #[test]
    fn edges_of_more_than_two_triangles_are_not_linked() {
        let mesh = NavMesh::build([
            Triangle::new(
                DVec2::new(0.0, 0.0),
                DVec2::new(2.0, 0.0),
                DVec2::new(0.0, 2.0),
            ),
            Triangle::new(
                DVec2::new(2.0, 0.0),
                DVec2::new(2.0, 2.0),
                DVec2::new(0.0, 2.0),
            ),
            Triangle::new(
                DVec2::new(2.0, 0.0),
                DVec2::new(0.0, 2.0),
                DVec2::new(3.0, 3.0),
            ),
            Triangle::new(
                DVec2::new(2.0, 0.0),
                DVec2::new(3.0, 3.0),
                DVec2::new(4.0, 0.0),
            ),
        ]);
        assert!(mesh.neighbors(TriangleIndex(0)).next().is_none());
        assert!(mesh.neighbors(TriangleIndex(1)).next().is_none());
        // The edge (2, 0) - (3, 3) only has two triangles.
        assert_eq!(
            mesh.neighbors(TriangleIndex(2)).collect::<Vec<_>>(),
            vec![TriangleIndex(3)]
        );
    }

    #[test]
    fn nodes_are_wound_counter_clockwise() {
        let mesh = NavMesh::build([Triangle::new(
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 2.0),
            DVec2::new(2.0, 0.0),
        )]);
        assert!(mesh.nodes()[0].triangle.signed_area2() > 0.0);
    }

    #[test]
    fn can_locate_points() {
        let mesh = two_triangles();
        assert_eq!(mesh.locate_index(DVec2::new(0.5, 0.5)), Some(TriangleIndex(0)));
        assert_eq!(mesh.locate_index(DVec2::new(1.5, 1.5)), Some(TriangleIndex(1)));
        // On the shared edge, the first triangle wins.
        assert_eq!(mesh.locate_index(DVec2::new(1.0, 1.0)), Some(TriangleIndex(0)));
        assert_eq!(mesh.locate_index(DVec2::new(3.0, 1.0)), None);
        assert_eq!(mesh.locate_index(DVec2::new(-1.0, -1.0)), None);
    }

    #[test]
    fn can_block_triangles() {
        let mut mesh = two_triangles();
        assert!(!mesh.is_blocked(TriangleIndex(1)));
        mesh.set_blocked(TriangleIndex(1), true).unwrap();
        assert!(mesh.is_blocked(TriangleIndex(1)));
        assert!(!mesh.is_blocked(TriangleIndex(0)));
        mesh.set_blocked(TriangleIndex(1), false).unwrap();
        assert!(!mesh.is_blocked(TriangleIndex(1)));
    }

    #[test]
    fn blocking_unknown_triangle_fails() {
        let mut mesh = two_triangles();
        assert_eq!(
            mesh.set_blocked(TriangleIndex(7), true),
            Err(NavMeshError::IndexOutOfBounds {
                index: TriangleIndex(7),
                len: 2
            })
        );
        assert!(!mesh.is_blocked(TriangleIndex(7)));
    }

    #[test]
    fn can_restore_blocked_flags() {
        let mut mesh = two_triangles();
        mesh.set_blocked(TriangleIndex(0), true).unwrap();
        let flags: Vec<_> = mesh.blocked_flags().collect();
        assert_eq!(
            flags,
            vec![(TriangleIndex(0), true), (TriangleIndex(1), false)]
        );

        let mut restored = two_triangles();
        let applied =
            restored.apply_blocked_flags(flags.into_iter().chain([(TriangleIndex(9), true)]));
        assert_eq!(applied, 2);
        assert_eq!(restored, mesh);
    }

    #[test]
    fn can_rebuild_from_points() {
        let config = NavMeshConfig::default();
        let mut mesh = NavMesh::from_points(
            &[
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(0.0, 1.0),
            ],
            &config,
        );
        mesh.set_blocked(TriangleIndex(0), true).unwrap();
        assert_eq!(mesh.len(), 1);

        let square = [
            DVec2::new(0.0, 0.0),
            DVec2::new(4.0, 0.0),
            DVec2::new(4.0, 4.0),
            DVec2::new(0.0, 4.0),
        ];
        mesh.rebuild(&square);
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.points(), &square);
        assert!(mesh.blocked_flags().all(|(_, blocked)| !blocked));
    }
}

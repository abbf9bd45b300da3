#![doc = include_str!("../../../readme.md")]

mod config;
mod edge;
pub mod funnel;
mod main_api;
pub mod math;
mod nav_mesh;
mod pathfinding;
mod triangle;
pub mod triangulation;

pub use config::{NavMeshConfig, NavMeshConfigBuilder, PathAnchor};
pub use edge::Edge;
pub use funnel::{Portal, string_pull};
pub use math::{Aabb2d, Circle};
pub use nav_mesh::{NavMesh, NavMeshError, TriangleIndex, TriangleNode};
pub use pathfinding::{Route, RouteError};
pub use triangle::Triangle;
pub use triangulation::{Triangulator, triangulate};

/// Re-export of the vector type used for all points.
pub use glam::DVec2;

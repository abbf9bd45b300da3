//! The line-oriented scene file: the input points in order, then the blocked flag of every triangle.
//!
//! ```text
//! 0 0
//! 10 0
//! 10 10
//! TRIANGLES
//! 0 1
//! ```
//!
//! Triangle indices are only meaningful together with the points above them, since they come from
//! triangulating exactly those points in exactly that order.

use std::{fmt, str::FromStr};

use glam::DVec2;
use thiserror::Error;
use trinav::{NavMesh, NavMeshConfig, TriangleIndex};

const TRIANGLES_SENTINEL: &str = "TRIANGLES";

/// Everything needed to restore a [`NavMesh`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    /// The triangulation input, in its original order.
    pub points: Vec<DVec2>,
    /// Blocked flags by triangle index.
    pub flags: Vec<(TriangleIndex, bool)>,
}

impl Scene {
    /// Captures the points and blocked flags of a mesh built with [`NavMesh::from_points`].
    pub fn from_navmesh(navmesh: &NavMesh) -> Self {
        Self {
            points: navmesh.points().to_vec(),
            flags: navmesh.blocked_flags().collect(),
        }
    }

    /// Triangulates the points and applies the stored flags.
    pub fn to_navmesh(&self, config: &NavMeshConfig) -> NavMesh {
        let mut navmesh = NavMesh::from_points(&self.points, config);
        let applied = navmesh.apply_blocked_flags(self.flags.iter().copied());
        if applied != self.flags.len() {
            tracing::warn!(
                "Applied {applied} of {} blocked flags, the scene does not match its triangulation",
                self.flags.len()
            );
        }
        navmesh
    }
}

/// A line of a scene file that is neither blank nor in the expected format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneParseError {
    /// A line before the sentinel that is not a point.
    #[error("Line {line}: expected `<x> <y>`, got `{text}`")]
    MalformedPoint {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        text: String,
    },
    /// A line after the sentinel that is not a blocked flag.
    #[error("Line {line}: expected `<index> <0|1>`, got `{text}`")]
    MalformedFlag {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        text: String,
    },
}

impl FromStr for Scene {
    type Err = SceneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scene = Scene::default();
        let mut in_triangles = false;
        for (i, raw) in s.lines().enumerate() {
            let line = i + 1;
            let text = raw.trim();
            if text.is_empty() {
                continue;
            }
            if text == TRIANGLES_SENTINEL && !in_triangles {
                in_triangles = true;
                continue;
            }
            if in_triangles {
                let flag = parse_flag(text).ok_or_else(|| SceneParseError::MalformedFlag {
                    line,
                    text: text.to_string(),
                })?;
                scene.flags.push(flag);
            } else {
                let point = parse_point(text).ok_or_else(|| SceneParseError::MalformedPoint {
                    line,
                    text: text.to_string(),
                })?;
                scene.points.push(point);
            }
        }
        tracing::debug!(
            "Parsed scene with {} points and {} blocked flags",
            scene.points.len(),
            scene.flags.len()
        );
        Ok(scene)
    }
}

fn parse_point(text: &str) -> Option<DVec2> {
    let mut fields = text.split_whitespace();
    let x = fields.next()?.parse().ok()?;
    let y = fields.next()?.parse().ok()?;
    fields.next().is_none().then(|| DVec2::new(x, y))
}

fn parse_flag(text: &str) -> Option<(TriangleIndex, bool)> {
    let mut fields = text.split_whitespace();
    let index = fields.next()?.parse().ok()?;
    let blocked = match fields.next()? {
        "0" => false,
        "1" => true,
        _ => return None,
    };
    fields
        .next()
        .is_none()
        .then_some((TriangleIndex(index), blocked))
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for point in &self.points {
            writeln!(f, "{} {}", point.x, point.y)?;
        }
        writeln!(f, "{TRIANGLES_SENTINEL}")?;
        for (index, blocked) in &self.flags {
            writeln!(f, "{index} {}", u8::from(*blocked))?;
        }
        Ok(())
    }
}

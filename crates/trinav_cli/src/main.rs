//! Command line front end for trinav: inspect scenes, query paths and toggle obstacles.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use glam::DVec2;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use trinav::{NavMesh, NavMeshConfig, NavMeshConfigBuilder, PathAnchor, TriangleIndex};

use crate::scene::Scene;

mod scene;

/// Builds 2D navigation meshes from scene files and finds paths across them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Triangulate a scene and print its triangles
    Build {
        /// Scene file
        #[arg(long)]
        input: PathBuf,

        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Find a path between two points of a scene
    Path {
        /// Scene file
        #[arg(long)]
        input: PathBuf,

        /// Start position (x,y)
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: DVec2,

        /// End position (x,y)
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: DVec2,

        /// Print JSON instead of one `x y` line per waypoint
        #[arg(long)]
        json: bool,
    },

    /// Block or unblock a triangle and write the scene back
    Block {
        /// Scene file
        #[arg(long)]
        input: PathBuf,

        /// Index of the triangle, as printed by `build`
        #[arg(long)]
        index: u32,

        /// Make the triangle walkable again
        #[arg(long)]
        unblock: bool,

        /// Where to write the scene. Prints to stdout if omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Overrides for [`NavMeshConfig`]. Unset flags keep the defaults.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Size of the super-triangle as a multiple of the scene's extent
    #[arg(long, global = true)]
    margin: Option<f64>,

    /// Triangle point that path costs are measured between
    #[arg(long, global = true, value_enum)]
    anchor: Option<Anchor>,

    /// Squared distance below which the funnel merges waypoints
    #[arg(long, global = true)]
    epsilon: Option<f64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Circumcenter,
    Incenter,
}

impl From<Anchor> for PathAnchor {
    fn from(anchor: Anchor) -> Self {
        match anchor {
            Anchor::Circumcenter => PathAnchor::Circumcenter,
            Anchor::Incenter => PathAnchor::Incenter,
        }
    }
}

impl ConfigArgs {
    fn to_config(&self) -> NavMeshConfig {
        let mut builder = NavMeshConfigBuilder::default();
        if let Some(margin) = self.margin {
            builder = builder.with_super_triangle_margin(margin);
        }
        if let Some(anchor) = self.anchor {
            builder = builder.with_path_anchor(anchor.into());
        }
        if let Some(epsilon) = self.epsilon {
            builder = builder.with_funnel_epsilon(epsilon);
        }
        builder.build()
    }
}

/// Parse a comma-separated point
fn parse_point(s: &str) -> Result<DVec2, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("Point must have 2 components, got {}", parts.len()));
    }
    let x = parts[0].trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = parts[1].trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(DVec2::new(x, y))
}

fn main() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.to_config();

    match cli.command {
        Command::Build { input, json } => build(&input, &config, json),
        Command::Path {
            input,
            from,
            to,
            json,
        } => path(&input, &config, from, to, json),
        Command::Block {
            input,
            index,
            unblock,
            output,
        } => block(&input, &config, TriangleIndex(index), !unblock, output.as_deref()),
    }
}

fn load_scene(input: &Path) -> Result<Scene> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read scene {}", input.display()))?;
    text.parse()
        .with_context(|| format!("Failed to parse scene {}", input.display()))
}

fn load_navmesh(input: &Path, config: &NavMeshConfig) -> Result<NavMesh> {
    let navmesh = load_scene(input)?.to_navmesh(config);
    tracing::info!(
        "Loaded {} with {} triangles",
        input.display(),
        navmesh.len()
    );
    Ok(navmesh)
}

#[derive(Serialize, Debug)]
struct TriangleSummary {
    index: TriangleIndex,
    vertices: [DVec2; 3],
    neighbors: Vec<TriangleIndex>,
    blocked: bool,
}

fn summarize(navmesh: &NavMesh) -> Vec<TriangleSummary> {
    navmesh
        .nodes()
        .iter()
        .map(|node| TriangleSummary {
            index: node.index,
            vertices: node.triangle.vertices,
            neighbors: node.neighbors().collect(),
            blocked: node.blocked,
        })
        .collect()
}

fn build(input: &Path, config: &NavMeshConfig, json: bool) -> Result<()> {
    let navmesh = load_navmesh(input, config)?;
    let triangles = summarize(&navmesh);
    if json {
        let json = serde_json::to_string_pretty(&triangles).context("Failed to serialize triangles")?;
        println!("{json}");
        return Ok(());
    }
    println!("{} triangles", triangles.len());
    for triangle in &triangles {
        let neighbors: Vec<String> = triangle.neighbors.iter().map(ToString::to_string).collect();
        let [a, b, c] = triangle.vertices;
        println!(
            "{}: ({}, {}) ({}, {}) ({}, {}) neighbors [{}]{}",
            triangle.index,
            a.x,
            a.y,
            b.x,
            b.y,
            c.x,
            c.y,
            neighbors.join(", "),
            if triangle.blocked { " blocked" } else { "" }
        );
    }
    Ok(())
}

fn path(input: &Path, config: &NavMeshConfig, from: DVec2, to: DVec2, json: bool) -> Result<()> {
    let navmesh = load_navmesh(input, config)?;
    let waypoints = navmesh.find_path(from, to);
    if waypoints.is_empty() {
        match navmesh.try_find_route(from, to) {
            Err(err) => tracing::warn!("No path: {err}"),
            Ok(_) => tracing::warn!("No path"),
        }
    }
    if json {
        let json = serde_json::to_string_pretty(&waypoints).context("Failed to serialize path")?;
        println!("{json}");
    } else {
        for waypoint in &waypoints {
            println!("{} {}", waypoint.x, waypoint.y);
        }
    }
    Ok(())
}

fn block(
    input: &Path,
    config: &NavMeshConfig,
    index: TriangleIndex,
    blocked: bool,
    output: Option<&Path>,
) -> Result<()> {
    let mut navmesh = load_navmesh(input, config)?;
    navmesh
        .set_blocked(index, blocked)
        .with_context(|| format!("Failed to update triangle {index}"))?;
    let scene = Scene::from_navmesh(&navmesh).to_string();
    match output {
        Some(output) => {
            fs::write(output, scene)
                .with_context(|| format!("Failed to write scene {}", output.display()))?;
            tracing::info!(
                "Triangle {index} is now {} in {}",
                if blocked { "blocked" } else { "walkable" },
                output.display()
            );
        }
        None => print!("{scene}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn can_parse_points() {
        assert_eq!(parse_point("1.5,-2"), Ok(DVec2::new(1.5, -2.0)));
        assert_eq!(parse_point(" 3 , 4 "), Ok(DVec2::new(3.0, 4.0)));
        assert!(parse_point("1,2,3").is_err());
        assert!(parse_point("1;2").is_err());
        assert!(parse_point("a,2").is_err());
    }

    #[test]
    fn can_parse_path_command() {
        let cli = Cli::try_parse_from([
            "trinav", "path", "--input", "scene.txt", "--from", "-1,0.5", "--to", "3,4",
            "--anchor", "incenter",
        ])
        .unwrap();
        let Command::Path { from, to, json, .. } = cli.command else {
            panic!("expected the path command, got {:?}", cli.command);
        };
        assert_eq!(from, DVec2::new(-1.0, 0.5));
        assert_eq!(to, DVec2::new(3.0, 4.0));
        assert!(!json);
        assert_eq!(cli.config.to_config().path_anchor, PathAnchor::Incenter);
    }

    #[test]
    fn invalid_overrides_fall_back_to_defaults() {
        let config = ConfigArgs {
            margin: Some(-3.0),
            anchor: None,
            epsilon: Some(f64::NAN),
        }
        .to_config();
        assert_eq!(config, NavMeshConfig::default());
        assert_eq!(ConfigArgs::default().to_config(), NavMeshConfig::default());
    }

    #[test]
    fn summary_lists_neighbors_and_flags() {
        let scene: Scene = "0 0\n10 0\n10 10\n0 10\n5 5\nTRIANGLES\n2 1\n"
            .parse()
            .unwrap();
        let navmesh = scene.to_navmesh(&NavMeshConfig::default());
        let summary = summarize(&navmesh);
        assert_eq!(summary.len(), 4);
        for triangle in &summary {
            assert_eq!(triangle.neighbors.len(), 2);
            assert_eq!(triangle.blocked, triangle.index == TriangleIndex(2));
        }
    }
}

use glam::DVec2;

use crate::{NavMesh, funnel::string_pull_with_epsilon};

impl NavMesh {
    /// Finds a smooth path from `start` to `end`.
    ///
    /// This runs the whole pipeline: locating both points, searching a [`Route`](crate::Route)
    /// of walkable triangles, extracting the portals between them and pulling a string through them.
    ///
    /// The returned waypoints begin with `start` and end with `end`.
    /// An empty vector means that there is no path, e.g. because one of the points is outside the mesh
    /// or all ways are blocked.
    pub fn find_path(&self, start: DVec2, end: DVec2) -> Vec<DVec2> {
        let route = self.find_route(start, end);
        if route.is_empty() {
            return Vec::new();
        }
        let portals = self.extract_portals(&route.triangles);
        let path = string_pull_with_epsilon(start, &portals, end, self.config().funnel_epsilon);
        tracing::trace!(
            "Found path with {} waypoints through {} triangles",
            path.len(),
            route.len()
        );
        path
    }
}

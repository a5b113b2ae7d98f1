//! Edge-to-face adjacency.

use hashbrown::HashMap;

/// One face's use of an undirected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeUse {
    face: u32,
    /// True when the face traverses the edge from the lower to the higher index.
    ascending: bool,
}

/// Maps every undirected edge to the faces that use it.
#[derive(Debug, Clone, Default)]
pub struct MeshAdjacency {
    edges: HashMap<(u32, u32), Vec<EdgeUse>>,
}

impl MeshAdjacency {
    /// Build adjacency for a face list.
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut edges: HashMap<(u32, u32), Vec<EdgeUse>> =
            HashMap::with_capacity(faces.len() * 3 / 2);

        for (face_idx, face) in faces.iter().enumerate() {
            for i in 0..3 {
                let a = face[i];
                let b = face[(i + 1) % 3];
                let key = if a < b { (a, b) } else { (b, a) };
                edges.entry(key).or_default().push(EdgeUse {
                    face: face_idx as u32,
                    ascending: a < b,
                });
            }
        }

        Self { edges }
    }

    /// Number of distinct undirected edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Faces using the edge `(a, b)`, in either direction.
    pub fn faces_for_edge(&self, a: u32, b: u32) -> Vec<u32> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edges
            .get(&key)
            .map(|uses| uses.iter().map(|u| u.face).collect())
            .unwrap_or_default()
    }

    /// Edges used by exactly one face.
    pub fn boundary_edges(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.edges
            .iter()
            .filter(|(_, uses)| uses.len() == 1)
            .map(|(&edge, _)| edge)
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.edges.values().filter(|uses| uses.len() == 1).count()
    }

    /// Edges used by more than two faces.
    pub fn non_manifold_edge_count(&self) -> usize {
        self.edges.values().filter(|uses| uses.len() > 2).count()
    }

    /// Manifold edges whose two faces traverse them in the same direction.
    ///
    /// A consistently wound surface walks every interior edge once each way.
    pub fn inconsistent_edge_count(&self) -> usize {
        self.edges
            .values()
            .filter(|uses| uses.len() == 2 && uses[0].ascending == uses[1].ascending)
            .count()
    }
}

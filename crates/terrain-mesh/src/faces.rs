//! Face connectivity for the closed terrain solid.
//!
//! The solid has a top surface following the elevation grid, a flat bottom
//! surface and four side walls joining the two along the grid border. Vertex
//! indices follow the layout produced by [`crate::build_vertices`]:
//!
//! - top vertex of sample `(r, c)`: `r * W + c`
//! - bottom vertex of sample `(r, c)`: `H * W + r * W + c`
//!
//! Rows run along +x, columns along +y and elevation along +z. Every face is
//! wound counter-clockwise seen from outside the solid, so the right-hand
//! normal points outward.
//!
//! Faces are emitted in a fixed order: for each grid cell in row-major order
//! two top faces then two bottom faces; then for each row the left and right
//! wall segments; then for each column the front and back wall segments.

use nalgebra::Vector3;
use rayon::prelude::*;

/// Face count of the closed solid over an `height x width` grid.
///
/// `4(H-1)(W-1)` surface faces plus `4(H-1) + 4(W-1)` wall faces. Zero when
/// either side is shorter than 2.
pub fn expected_face_count(height: usize, width: usize) -> usize {
    if height < 2 || width < 2 {
        return 0;
    }
    4 * (height - 1) * (width - 1) + 4 * (height - 1) + 4 * (width - 1)
}

/// One of the four side walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Column 0, facing -y.
    Left,
    /// Last column, facing +y.
    Right,
    /// Row 0, facing -x.
    Front,
    /// Last row, facing +x.
    Back,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Front, Side::Back];

    /// Outward unit normal of the wall.
    pub fn outward(self) -> Vector3<f64> {
        match self {
            Side::Left => -Vector3::y(),
            Side::Right => Vector3::y(),
            Side::Front => -Vector3::x(),
            Side::Back => Vector3::x(),
        }
    }

    /// Direction in which consecutive wall posts advance.
    ///
    /// Left and right walls follow the rows, front and back walls follow the
    /// columns.
    pub fn advance(self) -> Vector3<f64> {
        match self {
            Side::Left | Side::Right => Vector3::x(),
            Side::Front | Side::Back => Vector3::y(),
        }
    }

    /// Winding that makes this wall face outward.
    pub fn winding(self) -> Winding {
        if self.advance().cross(&Vector3::z()) == self.outward() {
            Winding::Forward
        } else {
            Winding::Reversed
        }
    }
}

/// Triangle order for a wall quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winding {
    /// Normal along `advance x z`.
    Forward,
    /// Normal along `-(advance x z)`.
    Reversed,
}

/// A vertical wall edge: the top and bottom vertex of one border sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallPost {
    pub top: u32,
    pub bottom: u32,
}

/// Two triangles spanning the wall between consecutive posts `a` and `b`.
pub fn wall_quad(a: WallPost, b: WallPost, winding: Winding) -> [[u32; 3]; 2] {
    match winding {
        Winding::Forward => [[a.bottom, b.bottom, a.top], [a.top, b.bottom, b.top]],
        Winding::Reversed => [[a.bottom, a.top, b.bottom], [b.bottom, a.top, b.top]],
    }
}

/// Generates the faces of the closed solid for a fixed grid shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceGenerator {
    height: usize,
    width: usize,
}

impl FaceGenerator {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    #[inline]
    pub fn top_index(&self, r: usize, c: usize) -> u32 {
        (r * self.width + c) as u32
    }

    #[inline]
    pub fn bottom_index(&self, r: usize, c: usize) -> u32 {
        (self.height * self.width + r * self.width + c) as u32
    }

    #[inline]
    pub fn post(&self, r: usize, c: usize) -> WallPost {
        WallPost {
            top: self.top_index(r, c),
            bottom: self.bottom_index(r, c),
        }
    }

    pub fn face_count(&self) -> usize {
        expected_face_count(self.height, self.width)
    }

    /// All faces in emission order.
    pub fn generate(&self) -> Vec<[u32; 3]> {
        if self.face_count() == 0 {
            return Vec::new();
        }
        let mut faces = self.surface_faces();
        faces.reserve(self.face_count() - faces.len());

        for r in 0..self.height - 1 {
            faces.extend(self.wall_segment(Side::Left, r));
            faces.extend(self.wall_segment(Side::Right, r));
        }
        for c in 0..self.width - 1 {
            faces.extend(self.wall_segment(Side::Front, c));
            faces.extend(self.wall_segment(Side::Back, c));
        }
        faces
    }

    /// Top and bottom faces, four per grid cell, cells in row-major order.
    pub fn surface_faces(&self) -> Vec<[u32; 3]> {
        if self.face_count() == 0 {
            return Vec::new();
        }
        let cells_per_row = self.width - 1;
        let mut faces = vec![[0u32; 3]; 4 * (self.height - 1) * cells_per_row];

        faces
            .par_chunks_mut(4 * cells_per_row)
            .enumerate()
            .for_each(|(r, row)| {
                for (c, cell) in row.chunks_exact_mut(4).enumerate() {
                    let tl = self.top_index(r, c);
                    let tr = self.top_index(r, c + 1);
                    let bl = self.top_index(r + 1, c);
                    let br = self.top_index(r + 1, c + 1);
                    let btl = self.bottom_index(r, c);
                    let btr = self.bottom_index(r, c + 1);
                    let bbl = self.bottom_index(r + 1, c);
                    let bbr = self.bottom_index(r + 1, c + 1);

                    cell[0] = [tl, bl, tr];
                    cell[1] = [bl, br, tr];
                    cell[2] = [btl, btr, bbl];
                    cell[3] = [bbl, btr, bbr];
                }
            });
        faces
    }

    /// The two faces of wall `side` between border posts `i` and `i + 1`.
    ///
    /// `i` is a row index for left/right walls and a column index for
    /// front/back walls.
    pub fn wall_segment(&self, side: Side, i: usize) -> [[u32; 3]; 2] {
        let (a, b) = match side {
            Side::Left => (self.post(i, 0), self.post(i + 1, 0)),
            Side::Right => (
                self.post(i, self.width - 1),
                self.post(i + 1, self.width - 1),
            ),
            Side::Front => (self.post(0, i), self.post(0, i + 1)),
            Side::Back => (
                self.post(self.height - 1, i),
                self.post(self.height - 1, i + 1),
            ),
        };
        wall_quad(a, b, side.winding())
    }

    /// Every face of one wall, in post order.
    pub fn wall_faces(&self, side: Side) -> Vec<[u32; 3]> {
        if self.face_count() == 0 {
            return Vec::new();
        }
        let segments = match side {
            Side::Left | Side::Right => self.height - 1,
            Side::Front | Side::Back => self.width - 1,
        };
        (0..segments)
            .flat_map(|i| self.wall_segment(side, i))
            .collect()
    }
}

/// Faces of the closed solid over an `height x width` grid.
pub fn generate_faces(height: usize, width: usize) -> Vec<[u32; 3]> {
    FaceGenerator::new(height, width).generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::MeshAdjacency;

    #[test]
    fn test_face_count_formula() {
        assert_eq!(expected_face_count(2, 2), 12);
        assert_eq!(expected_face_count(3, 4), 4 * 2 * 3 + 4 * 2 + 4 * 3);
        assert_eq!(expected_face_count(1024, 1252), 5_128_188);
        assert_eq!(expected_face_count(1, 5), 0);
        assert_eq!(expected_face_count(5, 0), 0);
    }

    #[test]
    fn test_side_windings() {
        assert_eq!(Side::Left.winding(), Winding::Forward);
        assert_eq!(Side::Back.winding(), Winding::Forward);
        assert_eq!(Side::Right.winding(), Winding::Reversed);
        assert_eq!(Side::Front.winding(), Winding::Reversed);

        for side in Side::ALL {
            assert_eq!(side.outward().dot(&side.advance()), 0.0, "{:?}", side);
            assert_eq!(side.outward().z, 0.0, "{:?}", side);
        }
    }

    #[test]
    fn test_two_by_two_faces() {
        let faces = generate_faces(2, 2);
        assert_eq!(
            faces,
            vec![
                // top
                [0, 2, 1],
                [2, 3, 1],
                // bottom
                [4, 5, 6],
                [6, 5, 7],
                // left, right
                [4, 6, 0],
                [0, 6, 2],
                [5, 1, 7],
                [7, 1, 3],
                // front, back
                [4, 0, 5],
                [5, 0, 1],
                [6, 7, 2],
                [2, 7, 3],
            ]
        );
    }

    #[test]
    fn test_closed_and_consistent() {
        for (h, w) in [(2, 2), (2, 5), (4, 3), (7, 7)] {
            let faces = generate_faces(h, w);
            assert_eq!(faces.len(), expected_face_count(h, w));
            let adj = MeshAdjacency::build(&faces);
            assert_eq!(adj.boundary_edge_count(), 0, "{}x{}", h, w);
            assert_eq!(adj.non_manifold_edge_count(), 0, "{}x{}", h, w);
            assert_eq!(adj.inconsistent_edge_count(), 0, "{}x{}", h, w);
        }
    }

    #[test]
    fn test_indices_in_range() {
        let (h, w) = (3, 5);
        let max = (2 * h * w) as u32;
        assert!(generate_faces(h, w).iter().flatten().all(|&i| i < max));
    }

    #[test]
    fn test_wall_faces_length() {
        let generator = FaceGenerator::new(4, 6);
        assert_eq!(generator.wall_faces(Side::Left).len(), 6);
        assert_eq!(generator.wall_faces(Side::Front).len(), 10);
        assert!(FaceGenerator::new(1, 6).wall_faces(Side::Left).is_empty());
    }

    #[test]
    fn test_degenerate_shapes_are_empty() {
        assert!(generate_faces(1, 1).is_empty());
        assert!(generate_faces(0, 3).is_empty());
    }
}

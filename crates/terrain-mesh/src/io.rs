//! Binary STL export and read-back.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::{Mesh, Vertex};

/// Size of the binary STL header that precedes the facet count.
pub const STL_HEADER_LEN: usize = 80;

/// Size of one binary STL facet record.
pub const STL_FACET_LEN: u64 = 50;

/// Save mesh to a binary STL file.
///
/// Facet normals are written as zero; slicers recompute them from the
/// vertex order.
pub fn save_stl(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!(path = %path.display(), faces = mesh.face_count(), "Saving STL");

    let file = File::create(path).map_err(|e| MeshError::io_write(path, e))?;
    write_stl(mesh, &file, path)?;

    debug!(triangles = mesh.face_count(), path = %path.display(), "Wrote STL");
    Ok(())
}

/// Write `mesh` as binary STL into `file`. `path` is only used in errors.
fn write_stl(mesh: &Mesh, file: &File, path: &Path) -> MeshResult<()> {
    let mut writer = BufWriter::new(file);

    let triangles: Vec<stl_io::Triangle> = mesh
        .faces
        .iter()
        .map(|&[i0, i1, i2]| {
            let v0 = &mesh.vertices[i0 as usize].position;
            let v1 = &mesh.vertices[i1 as usize].position;
            let v2 = &mesh.vertices[i2 as usize].position;

            stl_io::Triangle {
                normal: stl_io::Normal::new([0.0, 0.0, 0.0]),
                vertices: [
                    stl_io::Vertex::new([v0.x as f32, v0.y as f32, v0.z as f32]),
                    stl_io::Vertex::new([v1.x as f32, v1.y as f32, v1.z as f32]),
                    stl_io::Vertex::new([v2.x as f32, v2.y as f32, v2.z as f32]),
                ],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter())
        .map_err(|e| MeshError::io_write(path, std::io::Error::other(e.to_string())))?;

    writer.flush().map_err(|e| MeshError::io_write(path, e))
}

/// Save mesh to STL after checking its face count, then verify the header.
///
/// Refuses to write when `mesh` does not have exactly `expected_faces`
/// faces. The file is staged next to `path` and only renamed into place
/// once the facet count read back from it matches, so a failed export
/// never leaves a partial STL at `path`. Returns the facet count on success.
pub fn save_stl_checked(mesh: &Mesh, path: &Path, expected_faces: usize) -> MeshResult<u32> {
    if mesh.face_count() != expected_faces {
        return Err(MeshError::face_count_mismatch(
            mesh.face_count(),
            expected_faces,
        ));
    }

    info!(path = %path.display(), faces = mesh.face_count(), "Saving STL");
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = tempfile::Builder::new()
        .prefix(".terrain2stl-")
        .suffix(".stl.tmp")
        .tempfile_in(dir)
        .map_err(|e| MeshError::io_write(path, e))?;

    write_stl(mesh, staged.as_file(), path)?;

    let written = read_facet_count(staged.path())?;
    if written as usize != expected_faces {
        return Err(MeshError::face_count_mismatch(
            written as usize,
            expected_faces,
        ));
    }

    staged
        .persist(path)
        .map_err(|e| MeshError::io_write(path, e.error))?;
    info!(path = %path.display(), facets = written, "STL verified");
    Ok(written)
}

/// Read the facet count from a binary STL header.
///
/// Also checks that the file length matches the declared count.
pub fn read_facet_count(path: &Path) -> MeshResult<u32> {
    let mut file = File::open(path).map_err(|e| MeshError::io_read(path, e))?;

    let mut header = [0u8; STL_HEADER_LEN + 4];
    file.read_exact(&mut header).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            MeshError::parse_error(path, "file is shorter than a binary STL header")
        } else {
            MeshError::io_read(path, e)
        }
    })?;
    let count = LittleEndian::read_u32(&header[STL_HEADER_LEN..]);

    let len = file
        .metadata()
        .map_err(|e| MeshError::io_read(path, e))?
        .len();
    let expected_len = (STL_HEADER_LEN + 4) as u64 + count as u64 * STL_FACET_LEN;
    if len != expected_len {
        return Err(MeshError::parse_error(
            path,
            format!(
                "header declares {} facets ({} bytes) but file is {} bytes",
                count, expected_len, len
            ),
        ));
    }

    Ok(count)
}

/// Load an STL file (binary or ASCII) into an indexed mesh.
///
/// Coincident vertices are merged by the reader. Faces that reference the
/// same vertex twice are dropped with a warning.
pub fn load_stl(path: &Path) -> MeshResult<Mesh> {
    let file = File::open(path).map_err(|e| MeshError::io_read(path, e))?;
    let mut reader = BufReader::new(file);

    let stl =
        stl_io::read_stl(&mut reader).map_err(|e| MeshError::parse_error(path, e.to_string()))?;

    debug!(
        vertices = stl.vertices.len(),
        triangles = stl.faces.len(),
        "Read STL"
    );

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    mesh.vertices.extend(
        stl.vertices
            .iter()
            .map(|v| Vertex::from_coords(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64)),
    );

    let mut collapsed = 0usize;
    for face in &stl.faces {
        let [i0, i1, i2] = face.vertices.map(|i| i as u32);
        if i0 != i1 && i1 != i2 && i0 != i2 {
            mesh.faces.push([i0, i1, i2]);
        } else {
            collapsed += 1;
        }
    }
    if collapsed > 0 {
        warn!(collapsed, path = %path.display(), "Dropped collapsed triangles");
    }

    info!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        path = %path.display(),
        "Loaded STL"
    );
    Ok(mesh)
}

//! End-to-end integration tests for terrain-mesh.
//!
//! These tests lay out small tile trees on disk and run them through
//! load -> crop -> resample -> mesh -> validate -> save.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use terrain_grid::{
    CropSpec, Grid, LoadParams, MaskSpec, PlacementTable, TileLayout, TileLoader,
};
use terrain_mesh::{
    ConversionConfig, MeshBuilder, MeshError, MeshParams, Pipeline, Vertex, expected_face_count,
    load_stl, read_facet_count,
};

/// Raw sample for an elevation above the default 31-unit base.
fn raw_for(elevation: f32) -> u16 {
    ((elevation + 31.0) * 256.0) as u16
}

fn write_tile(path: &Path, side: usize, elevation: impl Fn(usize, usize) -> f32) {
    let mut bytes = Vec::with_capacity(side * side * 2);
    for y in 0..side {
        for x in 0..side {
            bytes.extend_from_slice(&raw_for(elevation(x, y)).to_le_bytes());
        }
    }
    fs::write(path, bytes).unwrap();
}

/// One region folder holding one 2x2-sample tile.
fn toy_layout() -> TileLayout {
    TileLayout {
        tile_side: 2,
        tiles_per_side: 1,
        placement: PlacementTable::single(),
    }
}

/// Config for the toy tree: no crop, no mask, no resampling, unit scale.
fn toy_config(input: &Path, output: &Path) -> ConversionConfig {
    let mut config = ConversionConfig {
        input_dir: input.to_path_buf(),
        output: output.to_path_buf(),
        ..Default::default()
    };
    config.grid.layout = toy_layout();
    config.grid.crop = CropSpec::Disabled;
    config.grid.mask = MaskSpec::Disabled;
    config.grid.downsample_factor = 1.0;
    config.mesh.target_size = 2.0;
    config
}

fn toy_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    let region = dir.path().join("region_00");
    fs::create_dir(&region).unwrap();
    // Row 0: 0, 4. Row 1: 2, 6.
    write_tile(&region.join("a.hght"), 2, |x, y| (4 * x + 2 * y) as f32);
    dir
}

#[test]
fn test_toy_tile_exact_solid() {
    let dir = toy_tree();
    let output = dir.path().join("toy.stl");
    let pipeline = Pipeline::new(toy_config(dir.path(), &output)).unwrap();

    let grid = TileLoader::new(LoadParams {
        layout: toy_layout(),
        ..Default::default()
    })
    .load_dir(dir.path(), "hght")
    .unwrap();
    assert_eq!(grid.row(0), &[0.0, 4.0]);
    assert_eq!(grid.row(1), &[2.0, 6.0]);

    let mesh = pipeline.mesh_from_grid(&grid).unwrap();

    // scale = 2 / 2 = 1, zoom = 1, bottom z = -20
    assert_eq!(
        mesh.vertices,
        vec![
            Vertex::from_coords(0.0, 0.0, 0.0),
            Vertex::from_coords(0.0, 1.0, 4.0),
            Vertex::from_coords(1.0, 0.0, 2.0),
            Vertex::from_coords(1.0, 1.0, 6.0),
            Vertex::from_coords(0.0, 0.0, -20.0),
            Vertex::from_coords(0.0, 1.0, -20.0),
            Vertex::from_coords(1.0, 0.0, -20.0),
            Vertex::from_coords(1.0, 1.0, -20.0),
        ]
    );
    assert_eq!(
        mesh.faces,
        vec![
            [0, 2, 1],
            [2, 3, 1],
            [4, 5, 6],
            [6, 5, 7],
            [4, 6, 0],
            [0, 6, 2],
            [5, 1, 7],
            [7, 1, 3],
            [4, 0, 5],
            [5, 0, 1],
            [6, 7, 2],
            [2, 7, 3],
        ]
    );
    assert!(mesh.validate().is_printable());
}

#[test]
fn test_toy_tile_pipeline_writes_stl() {
    let dir = toy_tree();
    let output = dir.path().join("toy.stl");
    let summary = Pipeline::new(toy_config(dir.path(), &output))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(summary.region_count, 1);
    assert_eq!(summary.tile_count, 1);
    assert_eq!(summary.full_shape, (2, 2));
    assert_eq!(summary.resampled_shape, (2, 2));
    assert_eq!(summary.vertex_count, 8);
    assert_eq!(summary.face_count, 12);
    assert_eq!(summary.facets_written, 12);
    assert!(summary.report.as_ref().is_some_and(|r| r.is_printable()));

    assert_eq!(read_facet_count(&output).unwrap(), 12);
    let loaded = load_stl(&output).unwrap();
    assert_eq!(loaded.vertex_count(), 8);
    assert_eq!(loaded.face_count(), 12);
    assert!(loaded.validate().is_printable());
}

#[test]
fn test_debug_raster_written() {
    let dir = toy_tree();
    let output = dir.path().join("toy.stl");
    let raster = dir.path().join("toy.png");
    let mut config = toy_config(dir.path(), &output);
    config.debug_raster = Some(raster.clone());

    Pipeline::new(config).unwrap().run().unwrap();
    assert!(raster.exists());
}

#[test]
fn test_constant_elevation_heights() {
    let elevation = 10.0;
    let grid = Grid::filled(5, 4, elevation);
    let params = MeshParams::default();
    let mesh = MeshBuilder::with_params(params).build(&grid).unwrap();

    let scale = params.target_size / 5.0;
    let top_z = elevation as f64 * params.zoom_factor * scale;
    let bottom_z = params.wall_thickness * params.zoom_factor * scale;

    let n = 5 * 4;
    assert!(mesh.vertices[..n].iter().all(|v| v.position.z == top_z));
    assert!(mesh.vertices[n..].iter().all(|v| v.position.z == bottom_z));

    let (min, max) = mesh.bounds().unwrap();
    let height = (elevation as f64 - params.wall_thickness) * params.zoom_factor * scale;
    assert!((max.z - min.z - height).abs() < 1e-9);
    // Rows run along x, columns along y.
    assert!((max.x - 3.0 * scale).abs() < 1e-9);
    assert!((max.y - 4.0 * scale).abs() < 1e-9);

    // A box: volume is footprint times height.
    let footprint = (3.0 * scale) * (4.0 * scale);
    let expected = footprint * height;
    assert!((mesh.signed_volume() - expected).abs() / expected < 1e-9);
}

#[test]
fn test_resampled_pipeline_face_count() {
    let dir = TempDir::new().unwrap();
    for (i, name) in ["r0", "r1"].iter().enumerate() {
        let region = dir.path().join(name);
        fs::create_dir(&region).unwrap();
        for k in 0..4 {
            write_tile(&region.join(format!("t{}.hght", k)), 8, |x, y| {
                (i * 10 + k + x + y) as f32
            });
        }
    }

    let output = dir.path().join("out.stl");
    let mut config = ConversionConfig {
        input_dir: dir.path().to_path_buf(),
        output: output.clone(),
        ..Default::default()
    };
    config.grid.layout = TileLayout {
        tile_side: 8,
        tiles_per_side: 2,
        placement: PlacementTable::raster(2, 1),
    };
    config.grid.crop = CropSpec::Disabled;
    config.grid.mask = MaskSpec::Disabled;

    let summary = Pipeline::new(config).unwrap().run().unwrap();
    assert_eq!(summary.full_shape, (16, 32));
    assert_eq!(summary.resampled_shape, (8, 16));
    assert_eq!(summary.face_count, expected_face_count(8, 16));
    assert_eq!(read_facet_count(&output).unwrap() as usize, summary.face_count);
}

#[test]
fn test_layout_mismatch_writes_nothing() {
    let dir = toy_tree();
    fs::create_dir(dir.path().join("region_01")).unwrap();
    write_tile(&dir.path().join("region_01").join("a.hght"), 2, |_, _| 1.0);

    let output = dir.path().join("toy.stl");
    let err = Pipeline::new(toy_config(dir.path(), &output))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, MeshError::Grid(_)));
    assert_eq!(err.code().as_str(), "MESH-3001");
    assert!(!output.exists());
}

#[test]
fn test_grid_too_small_after_resample() {
    let dir = toy_tree();
    let output = dir.path().join("toy.stl");
    let mut config = toy_config(dir.path(), &output);
    config.grid.downsample_factor = 0.1;
    let raster = dir.path().join("toy.png");
    config.debug_raster = Some(raster.clone());

    let err = Pipeline::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, MeshError::GridTooSmall { .. }));
    assert!(!output.exists());
    assert!(!raster.exists());
}

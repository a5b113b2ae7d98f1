//! Integration tests for terrain-grid: tile trees on disk through to a
//! cropped, resampled grid.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use terrain_grid::{
    CropRatios, CropWindow, Downsampler, GridError, LoadParams, MaskRatios, PlacementTable,
    ResampleFilter, TileLayout, TileLoader, crop_grid, discover_regions, write_debug_raster,
};

fn write_constant_tile(path: &Path, side: usize, elevation: f32) {
    let raw = ((elevation + 31.0) * 256.0) as u16;
    let bytes: Vec<u8> = (0..side * side).flat_map(|_| raw.to_le_bytes()).collect();
    fs::write(path, bytes).unwrap();
}

/// The 36-folder reference arrangement at a small tile size.
fn reference_tree(tile_side: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    for i in 0..36 {
        let region = dir.path().join(format!("region_{:02}", i));
        fs::create_dir(&region).unwrap();
        for k in 0..4 {
            write_constant_tile(
                &region.join(format!("tile_{}.hght", k)),
                tile_side,
                (i * 4 + k + 1) as f32,
            );
        }
    }
    dir
}

fn small_layout(tile_side: usize) -> TileLayout {
    TileLayout {
        tile_side,
        tiles_per_side: 2,
        placement: PlacementTable::reference(),
    }
}

#[test]
fn test_reference_placement() {
    let dir = reference_tree(2);
    let layout = small_layout(2);
    let grid = TileLoader::new(LoadParams {
        layout: layout.clone(),
        ..Default::default()
    })
    .load_dir(dir.path(), "hght")
    .unwrap();

    assert_eq!((grid.width(), grid.height()), (24, 24));

    let table = PlacementTable::reference();
    for i in 0..36 {
        let (sx, sy) = table.position(i);
        for k in 0..4 {
            let x = sx * 4 + (k % 2) * 2;
            let y = sy * 4 + (k / 2) * 2;
            let expected = (i * 4 + k + 1) as f32;
            assert_eq!(grid.get(x, y), expected, "folder {} quadrant {}", i, k);
            assert_eq!(grid.get(x + 1, y + 1), expected, "folder {} quadrant {}", i, k);
        }
    }
}

#[test]
fn test_every_super_tile_covered_once() {
    let dir = reference_tree(2);
    let grid = TileLoader::new(LoadParams {
        layout: small_layout(2),
        ..Default::default()
    })
    .load_dir(dir.path(), "hght")
    .unwrap();
    // Every value is positive, so no super-tile was left empty.
    assert!(grid.values().iter().all(|&v| v > 0.0));
}

#[test]
fn test_mask_in_global_coordinates() {
    let dir = reference_tree(4);
    let layout = small_layout(4);
    let window =
        CropWindow::compute(layout.grid_width(), layout.grid_height(), &CropRatios::default())
            .unwrap();
    let mask = MaskRatios::default().derive(&window).unwrap();

    let grid = TileLoader::new(LoadParams {
        layout,
        mask: Some(mask),
        ..Default::default()
    })
    .load_dir(dir.path(), "hght")
    .unwrap();

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if mask.contains(x, y) {
                assert_eq!(grid.get(x, y), 0.0, "({}, {}) should be masked", x, y);
            } else {
                assert!(grid.get(x, y) > 0.0, "({}, {}) should not be masked", x, y);
            }
        }
    }
}

#[test]
fn test_crop_then_resample() {
    let dir = reference_tree(4);
    let layout = small_layout(4);
    let window =
        CropWindow::compute(layout.grid_width(), layout.grid_height(), &CropRatios::default())
            .unwrap();

    let grid = TileLoader::new(LoadParams {
        layout,
        ..Default::default()
    })
    .load_dir(dir.path(), "hght")
    .unwrap();
    let cropped = crop_grid(grid, &window).unwrap();
    assert_eq!(cropped.shape(), (window.height(), window.width()));

    let raster = dir.path().join("cropped.png");
    write_debug_raster(&cropped, &raster).unwrap();
    assert!(raster.exists());

    let (min, max) = cropped.min_max().unwrap();
    let resampled = Downsampler::new(0.5, ResampleFilter::Linear)
        .apply(cropped)
        .unwrap();
    // Linear interpolation never leaves the input range.
    for &v in resampled.values() {
        assert!(v >= min - 1e-4 && v <= max + 1e-4);
    }
}

#[test]
fn test_discovery_ignores_other_files() {
    let dir = reference_tree(2);
    fs::write(dir.path().join("README.txt"), "not a tile").unwrap();
    fs::write(dir.path().join("region_00").join("notes.md"), "").unwrap();

    let regions = discover_regions(dir.path(), "hght").unwrap();
    assert_eq!(regions.len(), 36);
    assert!(regions.iter().all(|r| r.tiles.len() == 4));
}

#[test]
fn test_reference_table_needs_36_folders() {
    let dir = TempDir::new().unwrap();
    let region = dir.path().join("only");
    fs::create_dir(&region).unwrap();
    write_constant_tile(&region.join("a.hght"), 2, 1.0);

    let err = TileLoader::new(LoadParams {
        layout: small_layout(2),
        ..Default::default()
    })
    .load_dir(dir.path(), "hght")
    .unwrap_err();
    assert!(matches!(
        err,
        GridError::LayoutMismatch {
            found: 1,
            expected: 36
        }
    ));
}

//! terrain2stl inspect command - plan a conversion without running it.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use terrain_grid::{CropWindow, ExclusionMask, discover_regions, resample::output_len};
use terrain_mesh::{Pipeline, expected_face_count};
use tracing::debug;

use crate::{Cli, OutputFormat, output};

use super::base_config;

#[derive(Serialize)]
struct InspectInfo {
    input: String,
    folders_found: usize,
    folders_expected: usize,
    tiles_found: usize,
    tiles_expected: usize,
    layout_matches: bool,
    /// (height, width)
    full_shape: (usize, usize),
    #[serde(skip_serializing_if = "Option::is_none")]
    crop_window: Option<CropWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask: Option<ExclusionMask>,
    cropped_shape: (usize, usize),
    downsample_factor: f64,
    resampled_shape: (usize, usize),
    vertices: usize,
    faces: usize,
    /// Bytes in the binary STL: 84-byte preamble plus 50 per facet.
    stl_bytes: u64,
}

pub fn run(input: &Path, config: Option<&Path>, cli: &Cli) -> Result<()> {
    let info = plan(input, config)?;

    match cli.format {
        OutputFormat::Json => output::print(&info, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                print_text(&info);
            }
        }
    }

    Ok(())
}

/// Work out what a conversion of `input` would do without decoding tiles.
fn plan(input: &Path, config: Option<&Path>) -> Result<InspectInfo> {
    let mut config = base_config(config)?;
    config.input_dir = input.to_path_buf();
    let pipeline = Pipeline::new(config).context("Invalid conversion settings")?;
    let config = pipeline.config();
    let layout = &config.grid.layout;

    let regions = discover_regions(input, &config.grid.tile_extension)
        .with_context(|| format!("Failed to scan {}", input.display()))?;

    let window = pipeline.crop_window()?;
    let mask = pipeline.exclusion_mask(window.as_ref());

    let full_shape = (layout.grid_height(), layout.grid_width());
    let cropped_shape = window
        .map(|w| (w.height(), w.width()))
        .unwrap_or(full_shape);
    let factor = config.grid.downsample_factor;
    let resampled_shape = (
        output_len(cropped_shape.0, factor),
        output_len(cropped_shape.1, factor),
    );
    let faces = expected_face_count(resampled_shape.0, resampled_shape.1);
    debug!(
        folders = regions.len(),
        height = resampled_shape.0,
        width = resampled_shape.1,
        faces,
        "Planned conversion"
    );

    Ok(InspectInfo {
        input: input.display().to_string(),
        folders_found: regions.len(),
        folders_expected: layout.placement.len(),
        tiles_found: regions.iter().map(|r| r.tiles.len()).sum(),
        tiles_expected: layout.placement.len() * layout.quadrants(),
        layout_matches: regions.len() == layout.placement.len(),
        full_shape,
        crop_window: window,
        mask,
        cropped_shape,
        downsample_factor: factor,
        resampled_shape,
        vertices: 2 * resampled_shape.0 * resampled_shape.1,
        faces,
        stl_bytes: 84 + 50 * faces as u64,
    })
}

fn print_text(info: &InspectInfo) {
    println!("{}", "Conversion Plan".bold().underline());
    println!("  {}: {}", "Input".cyan(), info.input);

    let folders = format!("{} / {}", info.folders_found, info.folders_expected);
    println!(
        "  {}: {}",
        "Folders".cyan(),
        if info.layout_matches {
            folders.green()
        } else {
            folders.red().bold()
        }
    );
    let tiles = format!("{} / {}", info.tiles_found, info.tiles_expected);
    println!(
        "  {}: {}",
        "Tiles".cyan(),
        if info.tiles_found == info.tiles_expected {
            tiles.green()
        } else {
            tiles.yellow()
        }
    );

    println!(
        "  {}: {} x {}",
        "Assembled grid".cyan(),
        info.full_shape.1,
        info.full_shape.0
    );
    match &info.crop_window {
        Some(w) => println!(
            "  {}: x {}..={}, y {}..={}",
            "Crop".cyan(),
            w.x_min,
            w.x_max,
            w.y_min,
            w.y_max
        ),
        None => println!("  {}: {}", "Crop".cyan(), "disabled".dimmed()),
    }
    if let Some(m) = &info.mask {
        println!(
            "  {}: x {}..={}, y {}..={}",
            "Mask".cyan(),
            m.x_min,
            m.x_max,
            m.y_min,
            m.y_max
        );
    }
    println!(
        "  {}: {} x {} -> {} x {} (factor {})",
        "Resample".cyan(),
        info.cropped_shape.1,
        info.cropped_shape.0,
        info.resampled_shape.1,
        info.resampled_shape.0,
        info.downsample_factor
    );
    println!("  {}: {}", "Vertices".cyan(), info.vertices);
    println!("  {}: {}", "Faces".cyan(), info.faces);
    println!(
        "  {}: {:.1} MiB",
        "STL size".cyan(),
        info.stl_bytes as f64 / (1024.0 * 1024.0)
    );

    if !info.layout_matches {
        println!(
            "\n  {} conversion will fail: expected {} folders",
            "⚠".yellow(),
            info.folders_expected
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    /// `folders` region folders with four empty tiles each.
    fn tile_tree(folders: usize) -> TempDir {
        let dir = TempDir::new().unwrap();
        for f in 0..folders {
            let region = dir.path().join(format!("region_{:02}", f));
            fs::create_dir(&region).unwrap();
            for t in 0..4 {
                fs::write(region.join(format!("tile_{}.hght", t)), b"").unwrap();
            }
        }
        dir
    }

    #[test]
    fn test_reference_tree_plan() {
        let dir = tile_tree(36);
        let info = plan(dir.path(), None).unwrap();

        assert_eq!(info.folders_found, 36);
        assert_eq!(info.tiles_found, 144);
        assert_eq!(info.tiles_expected, 144);
        assert!(info.layout_matches);
        assert_eq!(info.full_shape, (3072, 3072));
        assert_eq!(info.cropped_shape, (2048, 2505));
        assert_eq!(info.resampled_shape, (1024, 1252));
        assert_eq!(info.faces, 5_128_188);
        assert_eq!(info.stl_bytes, 84 + 50 * 5_128_188);
        assert!(info.mask.is_some());
    }

    #[test]
    fn test_short_tree_flags_layout() {
        let dir = tile_tree(2);
        let info = plan(dir.path(), None).unwrap();

        assert_eq!(info.folders_found, 2);
        assert_eq!(info.folders_expected, 36);
        assert!(!info.layout_matches);
    }

    #[test]
    fn test_config_file_changes_plan() {
        let dir = tile_tree(36);
        let config = dir.path().join("terrain.toml");
        fs::write(
            &config,
            "[grid]\ndownsample_factor = 1.0\n\n[grid.crop]\nmode = \"disabled\"\n",
        )
        .unwrap();

        let info = plan(dir.path(), Some(&config)).unwrap();
        assert!(info.crop_window.is_none());
        assert!(info.mask.is_none());
        assert_eq!(info.resampled_shape, (3072, 3072));
    }
}

//! terrain2stl convert command - tile directory to STL.

use anyhow::{Context, Result};
use colored::Colorize;
use terrain_grid::{CropSpec, MaskSpec};
use terrain_mesh::{ConversionConfig, ConversionSummary, Pipeline};

use crate::{Cli, ConvertArgs, OutputFormat, output};

use super::base_config;

/// Layer the command-line flags over the file or default configuration.
fn apply_overrides(mut config: ConversionConfig, args: &ConvertArgs) -> ConversionConfig {
    config.input_dir = args.input.clone();
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(factor) = args.factor {
        config.grid.downsample_factor = factor;
    }
    if let Some(filter) = args.filter {
        config.grid.filter = filter.into();
    }
    if let Some(base) = args.base_height {
        config.grid.base_height_offset = base;
    }
    if let Some(wall) = args.wall_thickness {
        config.mesh.wall_thickness = wall;
    }
    if let Some(size) = args.target_size {
        config.mesh.target_size = size;
    }
    if let Some(zoom) = args.zoom {
        config.mesh.zoom_factor = Some(zoom);
    }
    if args.strict {
        config.grid.strict = true;
    }
    if args.no_crop {
        config.grid.crop = CropSpec::Disabled;
    }
    if args.no_mask {
        config.grid.mask = MaskSpec::Disabled;
    }
    if args.debug_raster.is_some() {
        config.debug_raster = args.debug_raster.clone();
    }
    if args.skip_validation {
        config.validate = false;
    }
    config
}

pub fn run(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    let config = apply_overrides(base_config(args.config.as_deref())?, args);

    let pipeline = Pipeline::new(config).context("Invalid conversion settings")?;
    let summary = pipeline.run().with_context(|| {
        format!(
            "Failed to convert {}",
            pipeline.config().input_dir.display()
        )
    })?;

    match cli.format {
        OutputFormat::Json => output::print(&summary, cli.format, cli.quiet),
        OutputFormat::Text => {
            if !cli.quiet {
                print_text(&summary);
            }
        }
    }

    Ok(())
}

fn print_text(summary: &ConversionSummary) {
    println!("{}", "Conversion Complete".bold().underline());
    println!("  {}: {}", "Input".cyan(), summary.input_dir.display());
    println!("  {}: {}", "Output".cyan(), summary.output.display());
    println!(
        "  {}: {} folders, {} tiles",
        "Tiles".cyan(),
        summary.region_count,
        summary.tile_count
    );
    println!(
        "  {}: {} x {}",
        "Assembled grid".cyan(),
        summary.full_shape.1,
        summary.full_shape.0
    );
    match &summary.crop_window {
        Some(w) => println!(
            "  {}: x {}..={}, y {}..={} ({} x {})",
            "Crop".cyan(),
            w.x_min,
            w.x_max,
            w.y_min,
            w.y_max,
            summary.cropped_shape.1,
            summary.cropped_shape.0
        ),
        None => println!("  {}: {}", "Crop".cyan(), "disabled".dimmed()),
    }
    if let Some(m) = &summary.mask {
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
        "  {}: {} x {}",
        "Resampled grid".cyan(),
        summary.resampled_shape.1,
        summary.resampled_shape.0
    );
    println!("  {}: {}", "Vertices".cyan(), summary.vertex_count);
    println!(
        "  {}: {} ({} written)",
        "Faces".cyan(),
        summary.face_count,
        summary.facets_written
    );
    if let Some((x, y, z)) = summary.dimensions {
        println!("  {}: {:.2} x {:.2} x {:.2}", "Size".cyan(), x, y, z);
    }
    match &summary.report {
        Some(report) if report.is_printable() => {
            println!("  {}: {}", "Watertight".cyan(), "Yes".green().bold());
            println!("  {}: {:.2}", "Volume".cyan(), report.volume);
        }
        Some(_) => println!("  {}: {}", "Watertight".cyan(), "No".red().bold()),
        None => println!("  {}: {}", "Validation".cyan(), "skipped".yellow()),
    }
    if let Some(path) = &summary.debug_raster {
        println!("  {}: {}", "Debug raster".cyan(), path.display());
    }
    println!("  {}: {:.0} ms", "Time".cyan(), summary.elapsed_ms);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use terrain_grid::ResampleFilter;

    use super::*;
    use crate::Commands;

    fn parse(args: &[&str]) -> ConvertArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Convert(args) => args,
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_defaults_untouched_without_flags() {
        let args = parse(&["terrain2stl", "convert", "tiles"]);
        let config = apply_overrides(ConversionConfig::default(), &args);
        let defaults = ConversionConfig::default();

        assert_eq!(config.input_dir, PathBuf::from("tiles"));
        assert_eq!(config.output, defaults.output);
        assert_eq!(config.grid.downsample_factor, defaults.grid.downsample_factor);
        assert_eq!(config.grid.crop, defaults.grid.crop);
        assert_eq!(config.grid.mask, defaults.grid.mask);
        assert!(config.validate);
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "terrain2stl",
            "convert",
            "tiles",
            "-o",
            "out.stl",
            "--factor",
            "0.25",
            "--filter",
            "linear",
            "--wall-thickness",
            "-5",
            "--target-size",
            "100",
            "--no-crop",
            "--no-mask",
            "--strict",
            "--skip-validation",
        ]);
        let config = apply_overrides(ConversionConfig::default(), &args);

        assert_eq!(config.output, PathBuf::from("out.stl"));
        assert_eq!(config.grid.downsample_factor, 0.25);
        assert_eq!(config.grid.filter, ResampleFilter::Linear);
        assert_eq!(config.mesh.wall_thickness, -5.0);
        assert_eq!(config.mesh.target_size, 100.0);
        assert_eq!(config.grid.crop, CropSpec::Disabled);
        assert_eq!(config.grid.mask, MaskSpec::Disabled);
        assert!(config.grid.strict);
        assert!(!config.validate);
        // Zoom follows the factor unless set.
        assert_eq!(config.mesh_params().zoom_factor, 0.25);
    }

    #[test]
    fn test_explicit_zoom() {
        let args = parse(&["terrain2stl", "convert", "tiles", "--zoom", "2"]);
        let config = apply_overrides(ConversionConfig::default(), &args);
        assert_eq!(config.mesh_params().zoom_factor, 2.0);
    }
}

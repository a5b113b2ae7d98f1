//! terrain2stl validate command - check an STL for printability.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use terrain_mesh::{Mesh, MeshReport, read_facet_count};

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct ValidationResult {
    path: String,
    valid: bool,
    facets: u32,
    issues: Vec<IssueInfo>,
    report: MeshReport,
}

#[derive(Serialize)]
struct IssueInfo {
    category: String,
    message: String,
    severity: String,
}

fn collect_issues(report: &MeshReport, facets: u32) -> Vec<IssueInfo> {
    let mut issues = Vec::new();

    if report.face_count == 0 {
        issues.push(IssueInfo {
            category: "geometry".to_string(),
            message: "Mesh has no faces".to_string(),
            severity: "error".to_string(),
        });
    }

    if !report.is_watertight {
        issues.push(IssueInfo {
            category: "topology".to_string(),
            message: format!(
                "Mesh is not watertight ({} boundary edges)",
                report.boundary_edge_count
            ),
            severity: "error".to_string(),
        });
    }

    if !report.is_manifold {
        issues.push(IssueInfo {
            category: "topology".to_string(),
            message: format!(
                "Mesh is not manifold ({} non-manifold edges)",
                report.non_manifold_edge_count
            ),
            severity: "error".to_string(),
        });
    }

    if !report.is_consistently_wound {
        issues.push(IssueInfo {
            category: "winding".to_string(),
            message: format!(
                "Inconsistent winding ({} edges walked twice in one direction)",
                report.inconsistent_edge_count
            ),
            severity: "error".to_string(),
        });
    }

    if report.is_inside_out {
        issues.push(IssueInfo {
            category: "winding".to_string(),
            message: "Mesh appears to be inside-out".to_string(),
            severity: "warning".to_string(),
        });
    }

    // Facets dropped on load are degenerate triangles.
    if facets as usize != report.face_count {
        issues.push(IssueInfo {
            category: "geometry".to_string(),
            message: format!(
                "{} of {} facets are degenerate",
                (facets as usize).saturating_sub(report.face_count),
                facets
            ),
            severity: "warning".to_string(),
        });
    }

    issues
}

pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    let facets = read_facet_count(input)
        .with_context(|| format!("Failed to read STL header from {:?}", input))?;
    let mesh =
        Mesh::load(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;

    let report = mesh.validate();
    let issues = collect_issues(&report, facets);
    let valid = issues.iter().all(|i| i.severity != "error");

    let result = ValidationResult {
        path: input.display().to_string(),
        valid,
        facets,
        issues,
        report,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                print_text(&result);
            }
        }
    }

    // Exit with error code if invalid
    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}

fn print_text(result: &ValidationResult) {
    println!("{}", "Validation Report".bold().underline());
    println!("  {}: {}", "File".cyan(), result.path);

    if result.valid {
        println!("  {}: {}", "Status".cyan(), "Valid".green().bold());
    } else {
        println!("  {}: {}", "Status".cyan(), "Issues found".red().bold());
    }

    let report = &result.report;
    println!("  {}: {}", "Facets".cyan(), result.facets);
    println!("  {}: {}", "Vertices".cyan(), report.vertex_count);
    if let Some((x, y, z)) = report.dimensions {
        println!("  {}: {:.2} x {:.2} x {:.2}", "Size".cyan(), x, y, z);
    }
    if report.is_watertight {
        println!("  {}: {:.2}", "Volume".cyan(), report.volume);
    }
    println!("  {}: {:.2}", "Surface area".cyan(), report.surface_area);

    if !result.issues.is_empty() {
        println!("\n{}", "Issues:".bold());
        for issue in &result.issues {
            let icon = match issue.severity.as_str() {
                "error" => "✗".red(),
                "warning" => "⚠".yellow(),
                _ => "ℹ".blue(),
            };
            println!("  {} [{}] {}", icon, issue.category, issue.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use terrain_grid::Grid;
    use terrain_mesh::{MeshBuilder, validate_mesh};

    use super::*;

    #[test]
    fn test_terrain_solid_has_no_issues() {
        let grid = Grid::from_rows(&[[1.0, 2.0, 3.0], [2.0, 4.0, 1.0]]).unwrap();
        let mesh = MeshBuilder::new().build(&grid).unwrap();
        let report = validate_mesh(&mesh);
        assert!(collect_issues(&report, mesh.face_count() as u32).is_empty());
    }

    #[test]
    fn test_open_surface_reports_errors() {
        let grid = Grid::from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
        let mut mesh = MeshBuilder::new().build(&grid).unwrap();
        // Drop the bottom pair, leaving a hole.
        mesh.faces.drain(2..4);
        let report = validate_mesh(&mesh);
        let issues = collect_issues(&report, mesh.face_count() as u32);
        assert!(
            issues
                .iter()
                .any(|i| i.category == "topology" && i.severity == "error")
        );
    }

    #[test]
    fn test_degenerate_facets_reported() {
        let grid = Grid::from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
        let mesh = MeshBuilder::new().build(&grid).unwrap();
        let report = validate_mesh(&mesh);
        let issues = collect_issues(&report, 14);
        assert!(issues.iter().any(|i| i.message == "2 of 14 facets are degenerate"));
    }
}

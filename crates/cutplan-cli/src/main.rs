use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use cutplan_core::{PlanRequest, PlanResult, Planner};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cutplan")]
#[command(about = "Panel cutting planner - calculate stock panel requirements for a parts list", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a cutting plan from a parts list
    Plan {
        /// Input file with settings and parts (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the plan (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render an SVG cutting diagram from a saved plan
    Generate {
        /// Input plan file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { input, output } => {
            plan_command(input, output)?;
        }
        Commands::Generate { input, output } => {
            generate_command(input, output)?;
        }
    }

    Ok(())
}

fn plan_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("{}", "Loading parts list...".bright_blue());

    let content = std::fs::read_to_string(&input)?;
    let request: PlanRequest = if input.extension().and_then(|s| s.to_str()) == Some("yaml")
        || input.extension().and_then(|s| s.to_str()) == Some("yml")
    {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    let piece_count: u32 = request.parts.iter().map(|p| p.quantity).sum();
    println!(
        "  {} parts, {} pieces to cut",
        request.parts.len().to_string().bright_white().bold(),
        piece_count.to_string().bright_white().bold()
    );
    println!(
        "  stock panel {} x {} mm, margin {} mm, kerf {} mm",
        request.settings.stock_width,
        request.settings.stock_height,
        request.settings.discard_margin,
        request.settings.kerf_width
    );
    println!();

    println!("{}", "Computing cutting plan...".bright_blue());
    let planner = Planner::new(request)?;
    let result = planner.plan()?;

    println!();
    println!("{}", "Plan complete".bright_green().bold());
    println!();

    println!("{}", "Results by thickness:".bright_yellow().bold());
    for (thickness, group) in &result.by_thickness {
        println!(
            "  {} mm: {} panels, {} pieces, {:.1}% used",
            thickness.to_string().bright_white(),
            group.panel_count.to_string().bright_white().bold(),
            group.part_count,
            group.usage_percent
        );
        if group.price_per_panel > 0.0 {
            println!(
                "    cost: {:.2} full / {:.2} proportional",
                group.cost, group.proportional_cost
            );
        }

        for placement in group.placements.iter().filter(|p| p.is_oversized()) {
            println!(
                "    {} {} / {} ({} x {} mm) does not fit the stock panel",
                "warning:".bright_yellow().bold(),
                placement.module_name,
                placement.part_name,
                placement.placed_width,
                placement.placed_height
            );
        }
    }

    println!();
    println!(
        "  Total panels: {}",
        result.total_panels.to_string().bright_white().bold()
    );
    println!("  Overall usage: {:.1}%", result.overall_usage_percent);
    if result.total_cost > 0.0 {
        println!(
            "  Total cost: {:.2} full / {:.2} proportional",
            result.total_cost, result.total_proportional_cost
        );
    }
    println!();

    let json = serde_json::to_string_pretty(&result)?;
    if let Some(output_path) = output {
        std::fs::write(&output_path, json)?;
        println!(
            "Saved plan to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn generate_command(input: PathBuf, output: PathBuf) -> Result<()> {
    println!("{}", "Loading plan...".bright_blue());

    let content = std::fs::read_to_string(&input)?;
    let result: PlanResult = serde_json::from_str(&content)?;

    println!("{}", "Rendering cutting diagram...".bright_blue());
    let svg = render_svg(&result)?;
    std::fs::write(&output, svg)?;

    println!();
    println!(
        "{} Saved SVG to {}",
        "Done.".bright_green(),
        output.display().to_string().bright_white()
    );

    Ok(())
}

/// Draws every stock panel of every thickness group in one vertical strip,
/// placements offset by the discard margin. Pure rendering: all geometry
/// comes from the plan itself.
fn render_svg(result: &PlanResult) -> Result<String> {
    use std::fmt::Write;

    let margin = 20.0;
    let scale = 2.0;
    let panel_spacing = 40.0;
    let discard = (result.stock.width - result.usable.width) / 2.0;

    let panel_w = result.stock.width / scale;
    let panel_h = result.stock.height / scale;
    let svg_width = panel_w + 2.0 * margin;
    let svg_height =
        result.total_panels as f64 * (panel_h + panel_spacing) + 2.0 * margin;

    let mut svg = String::new();
    writeln!(&mut svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        &mut svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        svg_width, svg_height, svg_width, svg_height
    )?;
    writeln!(
        &mut svg,
        r##"  <rect width="100%" height="100%" fill="#f5f5f5"/>"##
    )?;

    let mut y_offset = margin;

    for (thickness, group) in &result.by_thickness {
        for panel_index in 0..group.panel_count {
            let x = margin;

            writeln!(
                &mut svg,
                r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="#fff" stroke="#333" stroke-width="2"/>"##,
                x, y_offset, panel_w, panel_h
            )?;
            writeln!(
                &mut svg,
                r##"  <text x="{}" y="{}" font-family="Arial" font-size="14" fill="#333">{} mm #{}</text>"##,
                x,
                y_offset - 5.0,
                thickness,
                panel_index + 1
            )?;

            for placement in group
                .placements
                .iter()
                .filter(|p| p.panel_index as u32 == panel_index)
            {
                let px = x + (discard + placement.x) / scale;
                let py = y_offset + (discard + placement.y) / scale;
                let pw = placement.placed_width / scale;
                let ph = placement.placed_height / scale;

                let fill = if placement.is_oversized() {
                    "#E53935"
                } else {
                    "#4CAF50"
                };
                writeln!(
                    &mut svg,
                    r##"  <rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#2E7D32" stroke-width="1" opacity="0.7"/>"##,
                    px, py, pw, ph, fill
                )?;

                let label = if placement.rotated {
                    format!("{} (R)", placement.part_name)
                } else {
                    placement.part_name.clone()
                };
                writeln!(
                    &mut svg,
                    r##"  <text x="{}" y="{}" font-family="Arial" font-size="10" fill="#fff" text-anchor="middle">{}</text>"##,
                    px + pw / 2.0,
                    py + ph / 2.0 + 3.0,
                    label
                )?;
            }

            y_offset += panel_h + panel_spacing;
        }
    }

    writeln!(&mut svg, "</svg>")?;

    Ok(svg)
}

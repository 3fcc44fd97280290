use anyhow::{Context, Result, anyhow};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod io;
mod normalize;
mod table;

use cli::get_args;
use config::Layer;
use io::fabric::{read_table, render_table, write_layers};
use normalize::normalize;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Configuration
    let run = get_args()?;
    let paths = &run.paths;

    // Reading files
    let river_path = paths.input(Layer::River);
    let basin_path = paths.input(Layer::Basin);
    let mut river = read_table(Layer::River.name(), &river_path)
        .with_context(|| format!("Failed to load river layer: {:?}", river_path))?;
    let basin = read_table(Layer::Basin.name(), &basin_path)
        .with_context(|| format!("Failed to load basin layer: {:?}", basin_path))?;

    info!(
        fabric_code = %paths.fabric_code,
        river_records = river.records.len(),
        basin_records = basin.records.len(),
        "Loaded fabric"
    );

    let report = normalize(&mut river, &basin, &run.columns, run.policy)
        .with_context(|| format!("Failed to normalize headwater of {}", paths.fabric_code))?;

    // Render both layers before touching the output directory
    let outputs = [
        (paths.output(Layer::River), render_table(&river)),
        (paths.output(Layer::Basin), render_table(&basin)),
    ];

    std::fs::create_dir_all(&paths.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", paths.output_dir))?;
    write_layers(&outputs)?;

    if let Some(report_path) = &run.report {
        io::csv::save_report(report_path, &paths.fabric_code, &report)
            .map_err(|e| anyhow!("Failed to write report {:?}: {}", report_path, e))?;
        info!(path = %report_path.display(), "Repair report saved");
    }

    info!(
        fabric_code = %paths.fabric_code,
        identifier_filled = report.identifier_filled,
        geometry_filled = report.geometry_filled,
        fields_changed = report.changes.len(),
        output = %paths.output_dir.display(),
        "Headwater normalization complete"
    );
    Ok(())
}

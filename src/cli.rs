use crate::config::{ColumnConfig, FabricPaths, IdentifierPolicy};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Repair the headwater record of a distributed river/basin fabric
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Code of the basin to be processed
    #[arg(long)]
    fabric_code: String,

    /// Directory holding one sub-directory of fabric files per basin code
    #[arg(long)]
    input_root: PathBuf,

    /// Root output directory for processed files
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Identifier column shared by the river and basin layers
    #[arg(long, default_value = "COMID")]
    id_column: String,

    /// Stream order column of the river layer
    #[arg(long, default_value = "order")]
    order_column: String,

    /// Only treat a null identifier as missing (keep 0 as a real id)
    #[arg(long)]
    strict_id: bool,

    /// Write a CSV listing every field changed on the headwater record
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub paths: FabricPaths,
    pub columns: ColumnConfig,
    pub policy: IdentifierPolicy,
    pub report: Option<PathBuf>,
}

fn default_output_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
    Ok(cwd
        .join("..")
        .join("5-outputs")
        .join("shapefiles")
        .join("headwater")
        .join("shapes-distributed"))
}

pub fn get_args() -> Result<RunConfig> {
    let args = Args::parse();

    let output_root = match args.output_root {
        Some(root) => root,
        None => default_output_root()?,
    };

    let policy = if args.strict_id {
        IdentifierPolicy::NullOnly
    } else {
        IdentifierPolicy::Falsy
    };

    Ok(RunConfig {
        paths: FabricPaths::new(&args.fabric_code, &args.input_root, &output_root),
        columns: ColumnConfig {
            key: args.id_column,
            order: args.order_column,
        },
        policy,
        report: args.report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_fabric_convention() {
        let args = Args::parse_from(["fabric_rs", "--fabric-code", "X", "--input-root", "/in"]);
        assert_eq!(args.id_column, "COMID");
        assert_eq!(args.order_column, "order");
        assert!(!args.strict_id);
        assert!(args.output_root.is_none());
    }
}

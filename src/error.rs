use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FabricError {
    #[error("{table} table has no records")]
    EmptyTable { table: &'static str },
    #[error("{table} table has no `{column}` column")]
    MissingColumn { table: &'static str, column: String },
    #[error("cannot coerce `{column}` at record {row} to a nullable integer: {value}")]
    Coercion {
        column: String,
        row: usize,
        value: String,
    },
    #[error("failed to read fabric file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse fabric file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },
    #[error("{path:?} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection { path: PathBuf },
    #[error("failed to write fabric file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type FabricResult<T> = Result<T, FabricError>;

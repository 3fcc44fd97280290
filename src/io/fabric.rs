use crate::error::{FabricError, FabricResult};
use crate::table::{AttrValue, Column, ColumnKind, FabricRecord, FabricTable};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// Builds a table from a feature collection.
// Columns are the union of property keys in first-seen order.
pub fn table_from_collection(name: &'static str, collection: FeatureCollection) -> FabricTable {
    let mut table = FabricTable::new(name, &[]);
    table.foreign_members = collection.foreign_members;

    for feature in &collection.features {
        if let Some(props) = &feature.properties {
            for key in props.keys() {
                if table.column_index(key).is_none() {
                    table.columns.push(Column {
                        name: key.clone(),
                        kind: ColumnKind::Mixed,
                    });
                }
            }
        }
    }

    for feature in collection.features {
        let values = table
            .columns
            .iter()
            .map(|c| {
                feature
                    .properties
                    .as_ref()
                    .and_then(|p| p.get(&c.name))
                    .map(AttrValue::from_json)
                    .unwrap_or(AttrValue::Null)
            })
            .collect();
        table.records.push(FabricRecord {
            id: feature.id,
            values,
            geometry: feature.geometry,
        });
    }

    table
}

pub fn table_to_collection(table: &FabricTable) -> FeatureCollection {
    let features = table
        .records
        .iter()
        .map(|record| {
            let mut properties = JsonObject::new();
            for (column, value) in table.columns.iter().zip(&record.values) {
                properties.insert(column.name.clone(), value.to_json());
            }
            Feature {
                bbox: None,
                geometry: record.geometry.clone(),
                id: record.id.clone(),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: table.foreign_members.clone(),
    }
}

pub fn parse_table(name: &'static str, path: &Path, content: &str) -> FabricResult<FabricTable> {
    let geojson = content
        .parse::<GeoJson>()
        .map_err(|source| FabricError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(table_from_collection(name, fc)),
        _ => Err(FabricError::NotFeatureCollection {
            path: path.to_path_buf(),
        }),
    }
}

// Load one fabric layer from disk
pub fn read_table(name: &'static str, path: &Path) -> FabricResult<FabricTable> {
    let content = fs::read_to_string(path).map_err(|source| FabricError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_table(name, path, &content)?;
    debug!(
        layer = name,
        path = %path.display(),
        records = table.records.len(),
        columns = table.columns.len(),
        "read fabric layer"
    );
    Ok(table)
}

pub fn render_table(table: &FabricTable) -> String {
    GeoJson::FeatureCollection(table_to_collection(table)).to_string()
}

pub fn write_rendered(path: &Path, rendered: &str) -> FabricResult<()> {
    fs::write(path, rendered).map_err(|source| FabricError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        if let Err(e) = fs::remove_file(tmp) {
            warn!(path = %tmp.display(), error = %e, "failed to remove staged file");
        }
    }
}

/// Writes every layer under a temporary name first and only renames them into
/// place once all of them were written, so a failed write leaves no output.
pub fn write_layers(outputs: &[(PathBuf, String)]) -> FabricResult<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(outputs.len());
    for (path, rendered) in outputs {
        let tmp = staging_path(path);
        if let Err(e) = write_rendered(&tmp, rendered) {
            discard(&staged);
            return Err(e);
        }
        staged.push((tmp, path.as_path()));
    }

    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(source) = fs::rename(tmp, path) {
            discard(&staged[i..]);
            return Err(FabricError::Write {
                path: path.to_path_buf(),
                source,
            });
        }
        debug!(path = %path.display(), "wrote fabric layer");
    }
    Ok(())
}

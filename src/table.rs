use crate::error::{FabricError, FabricResult};
use geojson::feature::Id;
use geojson::{Geometry, JsonObject};
use serde_json::Value as JsonValue;
use std::fmt;

// A single attribute cell as read from a fabric file
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(JsonValue),
}

impl AttrValue {
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => AttrValue::Null,
            JsonValue::Bool(b) => AttrValue::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => AttrValue::Int(i),
                None => n.as_f64().map(AttrValue::Float).unwrap_or(AttrValue::Null),
            },
            JsonValue::String(s) => AttrValue::Text(s.clone()),
            other => AttrValue::Other(other.clone()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            AttrValue::Null => JsonValue::Null,
            AttrValue::Bool(b) => JsonValue::Bool(*b),
            AttrValue::Int(i) => JsonValue::from(*i),
            // NaN and infinities have no JSON representation
            AttrValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            AttrValue::Text(s) => JsonValue::String(s.clone()),
            AttrValue::Other(v) => v.clone(),
        }
    }

    /// Null, NaN and blank text all mean "no value".
    pub fn is_null(&self) -> bool {
        match self {
            AttrValue::Null => true,
            AttrValue::Float(f) => f.is_nan(),
            AttrValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Any value a loosely typed truth test would reject: null, zero, empty, false.
    /// Everything `is_null` accepts is falsy too.
    pub fn is_falsy(&self) -> bool {
        match self {
            AttrValue::Bool(b) => !b,
            AttrValue::Int(i) => *i == 0,
            AttrValue::Float(f) => *f == 0.0 || f.is_nan(),
            AttrValue::Text(s) => s.trim().is_empty(),
            AttrValue::Other(JsonValue::Array(a)) => a.is_empty(),
            AttrValue::Other(JsonValue::Object(o)) => o.is_empty(),
            AttrValue::Null | AttrValue::Other(_) => true,
        }
    }

    // Nullable-integer conversion; Err carries nothing, the caller knows where it failed
    fn to_nullable_int(&self) -> Result<AttrValue, ()> {
        match self {
            AttrValue::Null => Ok(AttrValue::Null),
            AttrValue::Int(i) => Ok(AttrValue::Int(*i)),
            AttrValue::Bool(b) => Ok(AttrValue::Int(i64::from(*b))),
            AttrValue::Float(f) if f.is_nan() => Ok(AttrValue::Null),
            AttrValue::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Ok(AttrValue::Int(*f as i64))
                } else {
                    Err(())
                }
            }
            AttrValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(AttrValue::Null)
                } else {
                    trimmed.parse::<i64>().map(AttrValue::Int).map_err(|_| ())
                }
            }
            AttrValue::Other(_) => Err(()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => Ok(()),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Float(v) => write!(f, "{}", v),
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Other(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Mixed,
    NullableInt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

// One feature: attribute values aligned with the table's columns
#[derive(Debug, Clone, PartialEq)]
pub struct FabricRecord {
    pub id: Option<Id>,
    pub values: Vec<AttrValue>,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FabricTable {
    pub name: &'static str,
    pub columns: Vec<Column>,
    pub records: Vec<FabricRecord>,
    pub foreign_members: Option<JsonObject>,
}

impl FabricTable {
    pub fn new(name: &'static str, column_names: &[&str]) -> Self {
        FabricTable {
            name,
            columns: column_names
                .iter()
                .map(|c| Column {
                    name: c.to_string(),
                    kind: ColumnKind::Mixed,
                })
                .collect(),
            records: Vec::new(),
            foreign_members: None,
        }
    }

    #[cfg(test)]
    pub fn push(&mut self, mut values: Vec<AttrValue>, geometry: Option<Geometry>) {
        values.resize(self.columns.len(), AttrValue::Null);
        self.records.push(FabricRecord {
            id: None,
            values,
            geometry,
        });
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn require_column(&self, name: &str) -> FabricResult<usize> {
        self.column_index(name)
            .ok_or_else(|| FabricError::MissingColumn {
                table: self.name,
                column: name.to_string(),
            })
    }

    pub fn first_record(&self) -> FabricResult<&FabricRecord> {
        self.records
            .first()
            .ok_or(FabricError::EmptyTable { table: self.name })
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&AttrValue> {
        self.records.get(row).and_then(|r| r.values.get(column))
    }

    pub fn set(&mut self, row: usize, column: usize, value: AttrValue) {
        if let Some(cell) = self
            .records
            .get_mut(row)
            .and_then(|r| r.values.get_mut(column))
        {
            *cell = value;
        }
    }

    /// Converts every value in the column to an integer or null. The column is
    /// only rewritten once every value has converted.
    pub fn coerce_nullable_int(&mut self, column: usize) -> FabricResult<()> {
        let mut converted = Vec::with_capacity(self.records.len());
        for (row, record) in self.records.iter().enumerate() {
            let value = &record.values[column];
            let int = value.to_nullable_int().map_err(|_| FabricError::Coercion {
                column: self.columns[column].name.clone(),
                row,
                value: format!("{:?}", value),
            })?;
            converted.push(int);
        }

        for (record, value) in self.records.iter_mut().zip(converted) {
            record.values[column] = value;
        }
        self.columns[column].kind = ColumnKind::NullableInt;
        Ok(())
    }
}

//! Headwater record repair.
//!
//! Automated fabric generation sometimes emits the first river record of a
//! headwater basin as a placeholder: no identifier, no geometry and
//! uninitialised attributes. [`normalize`] fills that record from the first
//! basin record and fixed defaults so routing tools can read the fabric as is.
//!
//! Only record 0 is ever written. The identifier column, `order` and every
//! other attribute column end up as nullable integers.

use crate::config::{ColumnConfig, IdentifierPolicy};
use crate::error::FabricResult;
use crate::table::{AttrValue, FabricTable};
use geojson::{Geometry, Value};
use serde::Serialize;
use tracing::{debug, info};

pub const HEADWATER_ROW: usize = 0;
pub const HEADWATER_ORDER: i64 = 1;

// One field of the headwater record that changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    pub identifier_filled: bool,
    pub geometry_filled: bool,
    pub changes: Vec<FieldChange>,
}

impl RepairReport {
    fn record(&mut self, field: &str, before: String, after: String) {
        if before != after {
            self.changes.push(FieldChange {
                field: field.to_string(),
                before,
                after,
            });
        }
    }
}

fn is_missing(value: &AttrValue, policy: IdentifierPolicy) -> bool {
    match policy {
        IdentifierPolicy::Falsy => value.is_falsy(),
        IdentifierPolicy::NullOnly => value.is_null(),
    }
}

fn describe_geometry(geometry: &Option<Geometry>) -> String {
    geometry
        .as_ref()
        .map(|g| g.value.type_name().to_string())
        .unwrap_or_default()
}

/// Repairs the headwater record of `river` in place.
///
/// Work happens on a copy that replaces `river` only once every step has
/// succeeded, so an error leaves the caller's table as it was.
pub fn normalize(
    river: &mut FabricTable,
    basin: &FabricTable,
    columns: &ColumnConfig,
    policy: IdentifierPolicy,
) -> FabricResult<RepairReport> {
    let key = river.require_column(&columns.key)?;
    let order = river.require_column(&columns.order)?;
    let basin_key = basin.require_column(&columns.key)?;
    river.first_record()?;
    let basin_head = basin.first_record()?;

    let mut fixed = river.clone();
    let mut report = RepairReport::default();

    // identifier
    let current = fixed.get(HEADWATER_ROW, key).cloned().unwrap_or(AttrValue::Null);
    if is_missing(&current, policy) {
        let replacement = basin_head.values[basin_key].clone();
        info!(
            column = %columns.key,
            basin_id = %replacement,
            "headwater identifier missing, taking it from the basin layer"
        );
        fixed.set(HEADWATER_ROW, key, replacement);
        report.identifier_filled = true;
    }
    fixed.coerce_nullable_int(key)?;
    report.record(
        &columns.key,
        current.to_string(),
        fixed.records[HEADWATER_ROW].values[key].to_string(),
    );

    // every other attribute is a placeholder zero on the headwater record
    let others: Vec<usize> = (0..fixed.columns.len()).filter(|&c| c != key).collect();
    let before: Vec<AttrValue> = others
        .iter()
        .map(|&c| fixed.records[HEADWATER_ROW].values[c].clone())
        .collect();
    for &col in &others {
        fixed.set(HEADWATER_ROW, col, AttrValue::Int(0));
        fixed.coerce_nullable_int(col)?;
        debug!(
            column = %fixed.columns[col].name,
            kind = ?fixed.columns[col].kind,
            "zeroed headwater attribute"
        );
    }

    fixed.set(HEADWATER_ROW, order, AttrValue::Int(HEADWATER_ORDER));
    fixed.coerce_nullable_int(order)?;

    for (&col, old) in others.iter().zip(before) {
        let name = fixed.columns[col].name.clone();
        let new = fixed.records[HEADWATER_ROW].values[col].to_string();
        report.record(&name, old.to_string(), new);
    }

    // geometry
    let head = &mut fixed.records[HEADWATER_ROW];
    if head.geometry.is_none() {
        info!("headwater geometry missing, placing a point at the origin");
        head.geometry = Some(Geometry::new(Value::Point(vec![0.0, 0.0])));
        report.geometry_filled = true;
        report.record("geometry", String::new(), describe_geometry(&head.geometry));
    }

    *river = fixed;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FabricError;
    use crate::table::ColumnKind;

    fn line() -> Geometry {
        Geometry::new(Value::LineString(vec![vec![-115.2, 51.1], vec![-115.1, 51.0]]))
    }

    fn basin(id: AttrValue) -> FabricTable {
        let mut t = FabricTable::new("basin", &["COMID", "unitarea"]);
        t.push(vec![id, AttrValue::Float(12.5)], None);
        t
    }

    fn run(river: &mut FabricTable, basin: &FabricTable) -> FabricResult<RepairReport> {
        normalize(river, basin, &ColumnConfig::new(), IdentifierPolicy::Falsy)
    }

    #[test]
    fn placeholder_headwater_is_filled() {
        let mut river = FabricTable::new("river", &["COMID", "order", "area"]);
        river.push(vec![AttrValue::Null, AttrValue::Null, AttrValue::Null], None);

        let report = run(&mut river, &basin(AttrValue::Int(7))).unwrap();

        let head = &river.records[0];
        assert_eq!(
            head.values,
            vec![AttrValue::Int(7), AttrValue::Int(1), AttrValue::Int(0)]
        );
        assert_eq!(
            head.geometry,
            Some(Geometry::new(Value::Point(vec![0.0, 0.0])))
        );
        assert!(report.identifier_filled);
        assert!(report.geometry_filled);
    }

    #[test]
    fn later_records_are_untouched() {
        let mut river = FabricTable::new("river", &["COMID", "order", "area"]);
        river.push(vec![AttrValue::Null, AttrValue::Null, AttrValue::Null], None);
        river.push(
            vec![AttrValue::Int(42), AttrValue::Int(3), AttrValue::Int(880)],
            Some(line()),
        );
        let second = river.records[1].clone();

        run(&mut river, &basin(AttrValue::Int(7))).unwrap();

        let head = &river.records[0];
        assert_eq!(
            head.values,
            vec![AttrValue::Int(7), AttrValue::Int(1), AttrValue::Int(0)]
        );
        assert_eq!(
            head.geometry,
            Some(Geometry::new(Value::Point(vec![0.0, 0.0])))
        );
        assert_eq!(river.records[1], second);
    }

    #[test]
    fn valid_headwater_still_gets_placeholder_attributes() {
        let mut river = FabricTable::new("river", &["COMID", "order", "uparea", "lengthkm"]);
        river.push(
            vec![
                AttrValue::Int(71027345),
                AttrValue::Int(4),
                AttrValue::Float(331.0),
                AttrValue::Int(9),
            ],
            Some(line()),
        );

        let report = run(&mut river, &basin(AttrValue::Int(7))).unwrap();

        let head = &river.records[0];
        assert_eq!(
            head.values,
            vec![
                AttrValue::Int(71027345),
                AttrValue::Int(1),
                AttrValue::Int(0),
                AttrValue::Int(0),
            ]
        );
        assert_eq!(head.geometry, Some(line()));
        assert!(!report.identifier_filled);
        assert!(!report.geometry_filled);
        let fields: Vec<_> = report.changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["order", "uparea", "lengthkm"]);
    }

    fn fill_with(id: AttrValue, policy: IdentifierPolicy) -> (AttrValue, bool) {
        let mut river = FabricTable::new("river", &["COMID", "order"]);
        river.push(vec![id, AttrValue::Null], Some(line()));
        let report = normalize(
            &mut river,
            &basin(AttrValue::Int(7)),
            &ColumnConfig::new(),
            policy,
        )
        .unwrap();
        (river.records[0].values[0].clone(), report.identifier_filled)
    }

    #[test]
    fn falsy_identifiers_are_missing_by_default() {
        let ids = [
            AttrValue::Null,
            AttrValue::Int(0),
            AttrValue::Float(0.0),
            AttrValue::Float(f64::NAN),
            AttrValue::Bool(false),
            AttrValue::Text(String::new()),
            AttrValue::Text("  ".into()),
        ];
        for id in ids {
            let (after, filled) = fill_with(id.clone(), IdentifierPolicy::Falsy);
            assert_eq!(after, AttrValue::Int(7), "{:?}", id);
            assert!(filled, "{:?}", id);
        }
    }

    #[test]
    fn null_like_identifiers_are_missing_under_null_only() {
        let ids = [
            AttrValue::Null,
            AttrValue::Float(f64::NAN),
            AttrValue::Text(String::new()),
            AttrValue::Text(" ".into()),
        ];
        for id in ids {
            let (after, filled) = fill_with(id.clone(), IdentifierPolicy::NullOnly);
            assert_eq!(after, AttrValue::Int(7), "{:?}", id);
            assert!(filled, "{:?}", id);
        }
    }

    #[test]
    fn blank_identifier_never_ends_up_null() {
        for policy in [IdentifierPolicy::Falsy, IdentifierPolicy::NullOnly] {
            let (after, _) = fill_with(AttrValue::Text(" ".into()), policy);
            assert_eq!(after, AttrValue::Int(7), "{:?}", policy);
        }
    }

    #[test]
    fn null_only_policy_keeps_zero_identifier() {
        let mut river = FabricTable::new("river", &["COMID", "order"]);
        river.push(vec![AttrValue::Int(0), AttrValue::Null], Some(line()));

        let report = normalize(
            &mut river,
            &basin(AttrValue::Int(7)),
            &ColumnConfig::new(),
            IdentifierPolicy::NullOnly,
        )
        .unwrap();

        assert_eq!(river.records[0].values[0], AttrValue::Int(0));
        assert!(!report.identifier_filled);
    }

    #[test]
    fn touched_columns_are_nullable_integers() {
        let mut river = FabricTable::new("river", &["COMID", "order", "slope", "NextDownID"]);
        river.push(vec![AttrValue::Null; 4], None);
        river.push(
            vec![
                AttrValue::Float(42.0),
                AttrValue::Float(2.0),
                AttrValue::Null,
                AttrValue::Text("41".into()),
            ],
            Some(line()),
        );

        run(&mut river, &basin(AttrValue::Float(7.0))).unwrap();

        for (i, col) in river.columns.iter().enumerate() {
            assert_eq!(col.kind, ColumnKind::NullableInt, "{}", col.name);
            for record in &river.records {
                assert!(matches!(record.values[i], AttrValue::Int(_) | AttrValue::Null));
            }
        }
        assert_eq!(river.records[0].values[0], AttrValue::Int(7));
        assert_eq!(river.records[1].values[3], AttrValue::Int(41));
    }

    #[test]
    fn non_numeric_text_fails_and_leaves_table_unchanged() {
        let mut river = FabricTable::new("river", &["COMID", "order", "name"]);
        river.push(vec![AttrValue::Null, AttrValue::Null, AttrValue::Null], None);
        river.push(
            vec![AttrValue::Int(42), AttrValue::Int(2), AttrValue::Text("Bow".into())],
            Some(line()),
        );
        let original = river.clone();

        let err = run(&mut river, &basin(AttrValue::Int(7))).unwrap_err();

        assert!(matches!(
            err,
            FabricError::Coercion { ref column, row: 1, .. } if column == "name"
        ));
        assert_eq!(river, original);
    }

    #[test]
    fn empty_tables_fail() {
        let mut river = FabricTable::new("river", &["COMID", "order"]);
        let err = run(&mut river, &basin(AttrValue::Int(7))).unwrap_err();
        assert!(matches!(err, FabricError::EmptyTable { table: "river" }));

        river.push(vec![AttrValue::Null, AttrValue::Null], None);
        let empty_basin = FabricTable::new("basin", &["COMID"]);
        let err = run(&mut river, &empty_basin).unwrap_err();
        assert!(matches!(err, FabricError::EmptyTable { table: "basin" }));
    }

    #[test]
    fn missing_order_column_fails() {
        let mut river = FabricTable::new("river", &["COMID", "area"]);
        river.push(vec![AttrValue::Null, AttrValue::Null], None);
        let err = run(&mut river, &basin(AttrValue::Int(7))).unwrap_err();
        assert!(matches!(err, FabricError::MissingColumn { ref column, .. } if column == "order"));
    }
}

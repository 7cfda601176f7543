// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Layer and joint tables (CSV) using pest

use crate::error::{Error, InputError, Result};
use crate::input::{JointSpec, LayerTable};
use nalgebra::{Point3, Vector3};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::path::Path;

#[derive(Parser)]
#[grammar = "io/tables.pest"]
struct TableParser;

/// Parse CSV text into rows of trimmed fields. Blank lines are skipped.
pub fn parse_csv(source: &str) -> std::result::Result<Vec<Vec<String>>, String> {
    let table = TableParser::parse(Rule::table, source)
        .map_err(|e| e.to_string())?
        .next()
        .ok_or_else(|| "empty parse".to_string())?;

    let rows = table
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::row)
        .map(|row| row.into_inner().map(field_text).collect::<Vec<_>>())
        .filter(|fields| fields.iter().any(|f| !f.is_empty()))
        .collect();
    Ok(rows)
}

fn field_text(field: Pair<Rule>) -> String {
    match field.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted => inner
            .into_inner()
            .next()
            .map(|q| q.as_str().replace("\"\"", "\""))
            .unwrap_or_default(),
        Some(inner) => inner.as_str().trim().to_string(),
        None => String::new(),
    }
}

fn read_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let source = source.strip_prefix('\u{feff}').unwrap_or(source.as_str());
    parse_csv(source).map_err(|reason| Error::Table {
        path: path.to_path_buf(),
        reason,
    })
}

/// Typed access to the fields of one data row
struct Row<'a> {
    table: &'static str,
    index: usize,
    fields: &'a [String],
}

impl<'a> Row<'a> {
    fn text(&self, column: usize) -> std::result::Result<&'a str, InputError> {
        self.fields
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| self.bad(format!("missing column {}", column + 1)))
    }

    fn number<T: std::str::FromStr>(&self, column: usize) -> std::result::Result<T, InputError> {
        let text = self.text(column)?;
        text.parse()
            .map_err(|_| self.bad(format!("column {} is not a number: '{}'", column + 1, text)))
    }

    fn bad(&self, reason: String) -> InputError {
        InputError::BadRow {
            table: self.table,
            row: self.index,
            reason,
        }
    }
}

/// Data rows (header dropped) numbered from 1 as in a spreadsheet
fn data_rows<'a>(table: &'static str, rows: &'a [Vec<String>]) -> impl Iterator<Item = Row<'a>> {
    rows.iter().enumerate().skip(1).map(move |(i, fields)| Row {
        table,
        index: i + 1,
        fields,
    })
}

/// `layer,component,z_start` rows into a [`LayerTable`]
pub fn layer_table_from_rows(rows: &[Vec<String>]) -> std::result::Result<LayerTable, InputError> {
    let entries = data_rows("layer table", rows)
        .map(|row| Ok((row.number::<usize>(0)?, row.text(1)?.to_string(), row.number::<f64>(2)?)))
        .collect::<std::result::Result<Vec<_>, InputError>>()?;
    LayerTable::from_rows(entries)
}

/// `name,componentA,componentB,x,y,z,dx,dy,dz` rows into joint specs
pub fn joints_from_rows(rows: &[Vec<String>]) -> std::result::Result<Vec<JointSpec>, InputError> {
    data_rows("joint table", rows)
        .map(|row| {
            let (name, style) = JointSpec::parse_name(row.text(0)?)?;
            Ok(JointSpec {
                name,
                style,
                component_a: row.text(1)?.to_string(),
                component_b: row.text(2)?.to_string(),
                anchor: Point3::new(row.number(3)?, row.number(4)?, row.number(5)?),
                axis: Vector3::new(row.number(6)?, row.number(7)?, row.number(8)?),
            })
        })
        .collect()
}

/// Read the layer/component table
pub fn read_layer_table(path: impl AsRef<Path>) -> Result<LayerTable> {
    let rows = read_rows(path.as_ref())?;
    Ok(layer_table_from_rows(&rows)?)
}

/// Read the joint table
pub fn read_joint_table(path: impl AsRef<Path>) -> Result<Vec<JointSpec>> {
    let rows = read_rows(path.as_ref())?;
    Ok(joints_from_rows(&rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_quoting() {
        let rows = parse_csv("a, b ,\"c,d\"\r\n\"say \"\"hi\"\"\",2\n\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["a", "b", "c,d"]);
        assert_eq!(rows[1], vec!["say \"hi\"", "2"]);
    }

    #[test]
    fn test_unterminated_quote_fails() {
        assert!(parse_csv("\"abc,1\n").is_err());
    }

    #[test]
    fn test_layer_table_rows() {
        let rows = parse_csv("layer,component,z\n0,base,0\n1,base,0.5\n").unwrap();
        let table = layer_table_from_rows(&rows).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.layers_of("base"), [0, 1]);
    }

    #[test]
    fn test_bad_number_reports_row() {
        let rows = parse_csv("layer,component,z\n0,base,zero\n").unwrap();
        let err = layer_table_from_rows(&rows).unwrap_err();
        assert!(matches!(err, InputError::BadRow { row: 2, .. }));
    }

    #[test]
    fn test_joint_rows() {
        let rows = parse_csv(
            "name,a,b,x,y,z,dx,dy,dz\nknee=stamp,thigh,shin,1,2,3,0,1,0\nhip,a,b,0,0,1,1,0,0\n",
        )
        .unwrap();
        let joints = joints_from_rows(&rows).unwrap();
        assert_eq!(joints.len(), 2);
        assert_eq!(joints[0].name, "knee");
        assert_eq!(joints[0].style.as_deref(), Some("stamp"));
        assert_eq!(joints[0].anchor, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(joints[1].style, None);
    }

    #[test]
    fn test_malformed_joint_name() {
        let rows = parse_csv("h\na=b=c,x,y,0,0,0,1,0,0\n").unwrap();
        assert!(matches!(
            joints_from_rows(&rows),
            Err(InputError::MalformedJointName(_))
        ));
    }
}

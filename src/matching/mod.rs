//! Integrating rows of two `SociomeDataFrame`s that describe the same
//! places: by location (`GeometricMatcher`) or by address text
//! (`AddressMatcher`).

pub mod address;
pub mod fuzz;
pub mod geometric;

pub use address::{find_address, AddressMatch, AddressMatcher, Transform};
pub use fuzz::token_set_ratio;
pub use geometric::GeometricMatcher;

use crate::frame::SociomeDataFrame;
use crate::types::Value;
use anyhow::{bail, Result};

pub const LEFT_SUFFIX: &str = "_left";
pub const RIGHT_SUFFIX: &str = "_right";

/// Build a frame from paired rows: `left_rows[i]` of `left` next to
/// `right_rows[i]` of `right`. Geometry comes from the left side; column
/// names present on both sides get `_left` / `_right` suffixes. A name
/// that still collides after suffixing is an error.
pub(crate) fn combine_rows(
    left: &SociomeDataFrame,
    left_rows: &[usize],
    right: &SociomeDataFrame,
    right_rows: &[usize],
) -> Result<SociomeDataFrame> {
    let mut out = SociomeDataFrame::from_geometry(left_rows.iter().map(|&i| left.geometry[i].clone()).collect());
    out.crs = left.crs.or(right.crs);

    let clash = |name: &str| left.has_column(name) && right.has_column(name);
    let renamed = |name: &str, suffix: &str| {
        if clash(name) {
            format!("{}{}", name, suffix)
        } else {
            name.to_string()
        }
    };

    for column in left.columns() {
        let values: Vec<Value> = left_rows.iter().map(|&i| column.values[i].clone()).collect();
        add_column(&mut out, renamed(&column.name, LEFT_SUFFIX), values)?;
    }
    for column in right.columns() {
        let values: Vec<Value> = right_rows.iter().map(|&i| column.values[i].clone()).collect();
        add_column(&mut out, renamed(&column.name, RIGHT_SUFFIX), values)?;
    }

    for name in left.subdivisions.iter() {
        out.subdivisions.push(renamed(name, LEFT_SUFFIX));
    }
    for name in right.subdivisions.iter() {
        out.subdivisions.push(renamed(name, RIGHT_SUFFIX));
    }
    Ok(out)
}

/// Add a column to a matched frame, refusing to replace an existing one.
pub(crate) fn add_column(out: &mut SociomeDataFrame, name: String, values: Vec<Value>) -> Result<()> {
    if out.has_column(&name) {
        bail!("Column '{}' already exists in the matched frame", name);
    }
    out.set_column(name, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: &[&str]) -> SociomeDataFrame {
        let mut frame = SociomeDataFrame::from_geometry(vec![None]);
        for name in columns {
            frame.set_column(*name, vec![Value::from(*name)]).unwrap();
        }
        frame
    }

    #[test]
    fn shared_names_get_suffixes() {
        let out = combine_rows(&frame(&["id", "x"]), &[0], &frame(&["x", "y"]), &[0]).unwrap();
        assert_eq!(out.column_names(), vec!["id", "x_left", "x_right", "y"]);
    }

    #[test]
    fn suffixed_name_collisions_are_errors() {
        let err = combine_rows(&frame(&["x", "x_right"]), &[0], &frame(&["x"]), &[0]).unwrap_err();
        assert!(err.to_string().contains("'x_right' already exists"), "{}", err);
    }
}

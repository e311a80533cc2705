use super::{parse_mappings, save_and_register};
use crate::frame::SociomeDataFrame;
use anyhow::Result;
use log::info;
use std::path::Path;

pub fn run(
    catalog: &Path,
    input: &Path,
    other: &Path,
    columns: &[String],
    subdivision: Option<&str>,
    right_on: Option<&str>,
    output: &Path,
) -> Result<()> {
    let mut frame = SociomeDataFrame::from_save_file(input, None)?;
    let other = SociomeDataFrame::from_save_file(other, None)?;
    let mappings = parse_mappings(columns)?;
    let pairs: Vec<(&str, &str)> = mappings.iter().map(|(s, d)| (s.as_str(), d.as_str())).collect();

    match subdivision {
        Some(subdivision) => {
            let right_on = right_on.unwrap_or(subdivision);
            info!("Linking on {} = {}", subdivision, right_on);
            frame.merge_on_subdivision(&other, subdivision, right_on, &pairs)?;
        }
        None => {
            info!("Linking by row position");
            frame.merge_on_geometry(&other, &pairs)?;
        }
    }

    save_and_register(catalog, &frame, output, None)?;
    println!("Linked {} column(s) into {}", pairs.len(), output.display());
    Ok(())
}

use super::save_and_register;
use crate::frame::SociomeDataFrame;
use anyhow::Result;
use std::path::Path;

pub fn run(catalog: &Path, input: &Path, regions: &Path, name: &str, key: &str, output: &Path) -> Result<()> {
    let mut frame = SociomeDataFrame::from_save_file(input, None)?;
    let regions = SociomeDataFrame::from_save_file(regions, None)?;
    frame.add_subdivision(&regions, name, key)?;

    let assigned = frame
        .require_column(name)?
        .iter()
        .filter(|v| !v.is_null())
        .count();
    save_and_register(catalog, &frame, output, None)?;
    println!("{} of {} rows fall inside a region", assigned, frame.len());
    Ok(())
}

use super::as_strs;
use crate::frame::SociomeDataFrame;
use anyhow::Result;
use clap::ValueEnum;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    Svg,
    Kepler,
}

pub fn run(input: &Path, columns: &[String], format: RenderFormat, sampling_rate: f64, output: &Path) -> Result<()> {
    let frame = SociomeDataFrame::from_save_file(input, None)?;
    let columns = as_strs(columns);
    match format {
        RenderFormat::Svg => frame.to_svg_file(output, &columns, sampling_rate)?,
        RenderFormat::Kepler => frame.to_kepler_html(output, &columns, sampling_rate)?,
    }
    println!("Rendered {} to {}", columns.join(", "), output.display());
    Ok(())
}

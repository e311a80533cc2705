use super::{as_strs, parse_mappings, save_and_register, InputArgs};
use crate::frame::SociomeDataFrame;
use crate::matching::{find_address, AddressMatcher, GeometricMatcher};
use crate::parser::arcgis::address_string;
use crate::parser::DatasetParser;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchMode {
    Geometric,
    Address,
}

/// Options of the `match` command beyond its input and output paths.
pub struct MatchOptions<'a> {
    pub mode: MatchMode,
    pub distance: f64,
    pub left_address: &'a [String],
    pub right_address: &'a [String],
    pub exact: &'a [String],
    pub min_score: u8,
}

pub fn run(
    catalog: &Path,
    left: &Path,
    right: &Path,
    right_args: &InputArgs,
    options: &MatchOptions,
    output: &Path,
) -> Result<()> {
    let left = SociomeDataFrame::from_save_file(left, None)?;
    let right = right_args.load(right)?;

    let matched = match options.mode {
        MatchMode::Geometric => GeometricMatcher::new(options.distance)?.match_frames(&left, &right)?,
        MatchMode::Address => {
            if options.left_address.is_empty() || options.right_address.is_empty() {
                bail!("Address matching needs --left-address and --right-address");
            }
            let mut matcher = AddressMatcher::new(&as_strs(options.left_address), &as_strs(options.right_address))
                .with_min_score(options.min_score);
            for (l, r) in parse_mappings(options.exact)? {
                matcher.add_exact_condition(&l, &r, None, None);
            }
            matcher.match_frames(&left, &right)?
        }
    };

    save_and_register(catalog, &matched, output, None)?;
    println!("Matched {} of {} rows", matched.len(), left.len());
    Ok(())
}

pub fn find(input: &Path, address: &str, zip: Option<&str>) -> Result<()> {
    let frame = DatasetParser::new(input, None)?.load(None, None)?;
    match find_address(&frame, address, zip)? {
        Some(hit) => {
            let p = frame.geometry[hit.row].as_ref().and_then(|g| g.representative_point());
            println!("{} (score {})", address_string(&frame, hit.row), hit.score);
            if let Some(p) = p {
                println!("lat {:.7}, lon {:.7}", p.y, p.x);
            }
        }
        None => println!("No address found"),
    }
    Ok(())
}

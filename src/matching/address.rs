use super::{add_column, combine_rows};
use super::fuzz::token_set_ratio;
use crate::frame::SociomeDataFrame;
use crate::parser::arcgis::{address_string, ARCGIS_BASIC_ZIP};
use crate::performance::Timer;
use crate::types::Value;
use anyhow::{bail, Result};
use log::{debug, info};
use std::collections::HashMap;

pub const MATCH_SCORE: &str = "match_score";

/// Normalisation applied to a blocking attribute before comparison.
pub type Transform = Box<dyn Fn(&Value) -> Value + Send + Sync>;

struct ExactCondition {
    left_attr: String,
    right_attr: String,
    left_xform: Option<Transform>,
    right_xform: Option<Transform>,
}

/// Best fuzzy match of a left row against the right frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressMatch {
    pub row: usize,
    pub score: u8,
}

/// One-to-best matching of rows between two frames: rows are first blocked
/// on attributes that must agree exactly, then within each block every left
/// row is paired with the right row whose address text is most similar.
#[derive(Default)]
pub struct AddressMatcher {
    conditions: Vec<ExactCondition>,
    address_left: Vec<String>,
    address_right: Vec<String>,
    min_score: u8,
}

impl AddressMatcher {
    pub fn new(address_left: &[&str], address_right: &[&str]) -> Self {
        let mut matcher = Self::default();
        matcher.add_address_match(address_left, address_right);
        matcher
    }

    /// Require `left_attr` (after `left_xform`) to equal `right_attr` (after
    /// `right_xform`) for two rows to be compared at all.
    pub fn add_exact_condition(
        &mut self,
        left_attr: &str,
        right_attr: &str,
        left_xform: Option<Transform>,
        right_xform: Option<Transform>,
    ) -> &mut Self {
        self.conditions.push(ExactCondition {
            left_attr: left_attr.to_string(),
            right_attr: right_attr.to_string(),
            left_xform,
            right_xform,
        });
        self
    }

    /// Attributes concatenated (space-separated) into the compared address.
    pub fn add_address_match(&mut self, left_attrs: &[&str], right_attrs: &[&str]) -> &mut Self {
        self.address_left = left_attrs.iter().map(|s| s.to_string()).collect();
        self.address_right = right_attrs.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Discard best matches scoring below `min_score` (0–100).
    pub fn with_min_score(mut self, min_score: u8) -> Self {
        self.min_score = min_score.min(100);
        self
    }

    pub fn match_frames(&self, left: &SociomeDataFrame, right: &SociomeDataFrame) -> Result<SociomeDataFrame> {
        if self.address_left.is_empty() || self.address_right.is_empty() {
            bail!("No address matching set");
        }
        let timer = Timer::new("[AddressMatcher] match");
        for attr in &self.address_left {
            left.require_column(attr)?;
        }
        for attr in &self.address_right {
            right.require_column(attr)?;
        }

        let left_blocks = self.block_keys(left, true)?;
        let right_blocks = self.block_keys(right, false)?;

        let mut right_groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (row, key) in right_blocks.iter().enumerate() {
            if let Some(key) = key {
                right_groups.entry(key.as_str()).or_default().push(row);
            }
        }
        let right_text: Vec<String> = (0..right.len())
            .map(|row| joined(right, row, &self.address_right))
            .collect();

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        let mut scores = Vec::new();
        for (row, key) in left_blocks.iter().enumerate() {
            let Some(candidates) = key.as_deref().and_then(|k| right_groups.get(k)) else {
                continue;
            };
            let text = joined(left, row, &self.address_left);
            if let Some(best) = best_match(&text, candidates.iter().map(|&r| (r, right_text[r].as_str()))) {
                debug!("{} -> {} ({})", text, right_text[best.row], best.score);
                if best.score >= self.min_score {
                    left_rows.push(row);
                    right_rows.push(best.row);
                    scores.push(Value::Number(best.score as f64));
                }
            }
        }
        info!(
            "[AddressMatcher] Matched {} of {} rows across {} blocks",
            left_rows.len(),
            left.len(),
            right_groups.len()
        );

        let mut out = combine_rows(left, &left_rows, right, &right_rows)?;
        add_column(&mut out, MATCH_SCORE.to_string(), scores)?;
        timer.finish();
        Ok(out)
    }

    /// Blocking key per row; `None` when any blocking attribute is missing.
    /// With no conditions every row shares one block.
    fn block_keys(&self, frame: &SociomeDataFrame, left_side: bool) -> Result<Vec<Option<String>>> {
        let mut parts: Vec<Vec<Option<String>>> = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let (attr, xform) = if left_side {
                (&condition.left_attr, &condition.left_xform)
            } else {
                (&condition.right_attr, &condition.right_xform)
            };
            let values = frame.require_column(attr)?;
            parts.push(
                values
                    .iter()
                    .map(|v| match xform {
                        Some(f) => f(v).key_string(),
                        None => v.key_string(),
                    })
                    .collect(),
            );
        }

        Ok((0..frame.len())
            .map(|row| {
                parts
                    .iter()
                    .map(|column| column[row].clone())
                    .collect::<Option<Vec<String>>>()
                    .map(|keys| keys.join("\u{1f}"))
            })
            .collect())
    }
}

fn joined(frame: &SociomeDataFrame, row: usize, attrs: &[String]) -> String {
    attrs
        .iter()
        .map(|a| frame.value(row, a).map(|v| v.to_string()).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Highest-scoring candidate; the earliest wins ties.
fn best_match<'a>(query: &str, candidates: impl Iterator<Item = (usize, &'a str)>) -> Option<AddressMatch> {
    let mut best: Option<AddressMatch> = None;
    for (row, text) in candidates {
        let score = token_set_ratio(query, text);
        if best.map_or(true, |b| score > b.score) {
            best = Some(AddressMatch { row, score });
        }
    }
    best
}

/// Find the row of an ArcGIS address frame that best matches a free-text
/// address, optionally restricted to one zip code.
pub fn find_address(frame: &SociomeDataFrame, address: &str, zipcode: Option<&str>) -> Result<Option<AddressMatch>> {
    let timer = Timer::new("[AddressMatcher] address query");
    let zips = frame.require_column(ARCGIS_BASIC_ZIP)?;
    let wanted = zipcode.and_then(|z| Value::from_csv_field(z).key_string());

    let texts: Vec<(usize, String)> = (0..frame.len())
        .filter(|&row| match &wanted {
            Some(zip) => zips[row].key_string().as_deref() == Some(zip.as_str()),
            None => true,
        })
        .map(|row| (row, address_string(frame, row).to_lowercase()))
        .collect();

    let query = address.to_lowercase();
    let best = best_match(&query, texts.iter().map(|(row, text)| (*row, text.as_str())));
    timer.finish();
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Geometry;

    fn clinics() -> SociomeDataFrame {
        let mut frame = SociomeDataFrame::from_geometry(vec![None, None, None]);
        frame
            .set_column(
                "street",
                vec!["1801 S Michigan Ave".into(), "200 W Madison St".into(), "5 N Wabash".into()],
            )
            .unwrap();
        frame
            .set_column("zip", vec![Value::from(60616.0), Value::from(60606.0), Value::Null])
            .unwrap();
        frame
    }

    fn addresses() -> SociomeDataFrame {
        let mut frame = SociomeDataFrame::from_geometry(vec![
            Some(Geometry::point(-87.65, 41.88)),
            Some(Geometry::point(-87.62, 41.85)),
            Some(Geometry::point(-87.63, 41.88)),
        ]);
        frame
            .set_column(
                "ADDRDELIV",
                vec!["200 W MADISON".into(), "1801 S MICHIGAN".into(), "1800 S MICHIGAN".into()],
            )
            .unwrap();
        frame
            .set_column(
                "Post_Code",
                vec!["60606".into(), "60616".into(), "60616".into()],
            )
            .unwrap();
        frame
    }

    #[test]
    fn blocks_then_picks_best_address() {
        let mut matcher = AddressMatcher::new(&["street"], &["ADDRDELIV"]);
        matcher.add_exact_condition("zip", "Post_Code", None, None);
        let out = matcher.match_frames(&clinics(), &addresses()).unwrap();

        // The clinic without a zip has no block.
        assert_eq!(out.len(), 2);
        assert_eq!(
            out.column("ADDRDELIV").unwrap(),
            &[Value::from("1801 S MICHIGAN"), Value::from("200 W MADISON")]
        );
        assert!(out.column(MATCH_SCORE).unwrap().iter().all(|s| s.as_f64().unwrap() > 80.0));
    }

    #[test]
    fn transforms_normalise_blocking_keys() {
        let mut left = clinics();
        left.set_column("city", vec!["chicago".into(), "CHICAGO ".into(), "Chicago".into()])
            .unwrap();
        let mut right = addresses();
        right.fill_column("Post_Comm", "CHICAGO".into()).unwrap();

        let upper: Transform = Box::new(|v| match v {
            Value::Text(s) => Value::Text(s.trim().to_uppercase()),
            other => other.clone(),
        });
        let mut matcher = AddressMatcher::new(&["street"], &["ADDRDELIV"]);
        matcher.add_exact_condition("city", "Post_Comm", Some(upper), None);
        let out = matcher.match_frames(&left, &right).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn missing_address_match_is_an_error() {
        let matcher = AddressMatcher::default();
        let err = matcher.match_frames(&clinics(), &addresses()).unwrap_err();
        assert!(err.to_string().contains("No address matching set"));
    }

    fn arcgis_points() -> SociomeDataFrame {
        let mut frame = SociomeDataFrame::from_geometry(vec![None; 4]);
        let columns: [(&str, Vec<Value>); 6] = [
            (
                "ADDRDELIV",
                vec!["1801 S MICHIGAN".into(), "600 S MICHIGAN".into(), "600 S MICHIGAN".into(), "10 E BALBO".into()],
            ),
            ("Post_Comm", vec!["CHICAGO".into(); 4]),
            ("State", vec!["IL".into(); 4]),
            (
                "Post_Code",
                vec![Value::from(60616.0), Value::from(60616.0), Value::from(60605.0), "60605".into()],
            ),
            ("LSt_Type", vec!["AVE".into(), "AVE".into(), "AVE".into(), "DR".into()]),
            ("LSt_PreDir", vec!["S".into(), "S".into(), "S".into(), "E".into()]),
        ];
        for (name, values) in columns {
            frame.set_column(name, values).unwrap();
        }
        frame
    }

    #[test]
    fn find_address_restricts_to_zip() {
        let frame = arcgis_points();
        // Numeric and text zip cells both match the typed zip.
        let hit = find_address(&frame, "600 S Michigan Ave", Some("60605")).unwrap().unwrap();
        assert_eq!(hit.row, 2);
        let hit = find_address(&frame, "10 E Balbo Dr", Some("60605")).unwrap().unwrap();
        assert_eq!(hit.row, 3);
        assert_eq!(hit.score, 100);
    }

    #[test]
    fn find_address_without_zip_searches_everything() {
        let frame = arcgis_points();
        let hit = find_address(&frame, "1801 S Michigan Ave Chicago", None).unwrap().unwrap();
        assert_eq!(hit.row, 0);
        // Equal scores keep the earliest row.
        let hit = find_address(&frame, "600 S Michigan Ave", None).unwrap().unwrap();
        assert_eq!(hit.row, 1);
    }

    #[test]
    fn find_address_unknown_zip_is_none() {
        let frame = arcgis_points();
        assert_eq!(find_address(&frame, "600 S Michigan Ave", Some("99999")).unwrap(), None);
        assert!(find_address(&clinics(), "600 S Michigan Ave", None).is_err());
    }

    #[test]
    fn existing_match_score_column_is_an_error() {
        let mut left = clinics();
        left.fill_column(MATCH_SCORE, Value::from(1.0)).unwrap();
        let err = AddressMatcher::new(&["street"], &["ADDRDELIV"])
            .match_frames(&left, &addresses())
            .unwrap_err();
        assert!(err.to_string().contains(MATCH_SCORE));
    }

    #[test]
    fn min_score_filters_weak_matches() {
        let matcher = AddressMatcher::new(&["street"], &["ADDRDELIV"]).with_min_score(100);
        let out = matcher.match_frames(&clinics(), &addresses()).unwrap();
        assert!(out.len() < 3);
    }
}

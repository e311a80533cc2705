//! Static renderings of a `SociomeDataFrame`: an SVG point map and a
//! kepler.gl HTML page.

pub mod kepler;
pub mod svg;

use crate::frame::SociomeDataFrame;
use anyhow::Result;
use std::borrow::Cow;

/// Rows to draw for a given sampling rate; 1 draws everything.
pub(crate) fn sampled(frame: &SociomeDataFrame, sampling_rate: f64) -> Result<Cow<'_, SociomeDataFrame>> {
    if sampling_rate >= 1.0 {
        Ok(Cow::Borrowed(frame))
    } else {
        Ok(Cow::Owned(frame.sample(sampling_rate)?))
    }
}

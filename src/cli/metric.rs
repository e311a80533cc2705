use super::{save_and_register, InputArgs};
use crate::frame::SociomeDataFrame;
use crate::metrics::{
    InterpolationParams, SpatialDensityFunction, SpatialFunction, SpatialIdentityFunction,
    SpatialInterpolationFunction, SpatialSubdivisionFunction, SpatialVoronoiFunction,
};
use anyhow::{anyhow, Result};
use clap::ValueEnum;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricKind {
    /// Geodesic distance in metres to the nearest source location.
    Voronoi,
    /// Source locations within a radius.
    Density,
    /// Per-subdivision aggregate.
    Subdivision,
    /// Value at the same coordinates.
    Identity,
    /// Gaussian-kernel interpolation.
    Interpolation,
}

/// Options of the `metric` command beyond its input and output paths.
pub struct MetricOptions<'a> {
    pub kind: MetricKind,
    pub name: &'a str,
    pub column: Option<&'a str>,
    pub subdivision: Option<&'a str>,
    pub subdivision_right: Option<&'a str>,
    pub radius: f64,
    pub sigma2: Option<f64>,
    pub precision: Option<f64>,
}

/// Build the spatial function a command line asks for.
pub fn build_function(source: &SociomeDataFrame, options: &MetricOptions) -> Result<Box<dyn SpatialFunction>> {
    let column = || options.column.ok_or_else(|| anyhow!("--column is required for {:?}", options.kind));
    let function: Box<dyn SpatialFunction> = match options.kind {
        MetricKind::Voronoi => Box::new(SpatialVoronoiFunction::new(source)),
        MetricKind::Density => Box::new(SpatialDensityFunction::new(source, options.radius)?),
        MetricKind::Subdivision => {
            let subdivision = options
                .subdivision
                .ok_or_else(|| anyhow!("--subdivision is required for subdivision metrics"))?;
            Box::new(SpatialSubdivisionFunction::new(
                source,
                subdivision,
                column()?,
                options.subdivision_right,
            )?)
        }
        MetricKind::Identity => Box::new(SpatialIdentityFunction::new(source, column()?)?),
        MetricKind::Interpolation => {
            let defaults = InterpolationParams::default();
            let params = InterpolationParams {
                sigma2: options.sigma2.unwrap_or(defaults.sigma2),
                precision: options.precision.unwrap_or(defaults.precision),
            };
            Box::new(SpatialInterpolationFunction::new(source, column()?, params)?)
        }
    };
    Ok(function)
}

pub fn run(
    catalog: &Path,
    input: &Path,
    source: &Path,
    source_args: &InputArgs,
    options: &MetricOptions,
    output: &Path,
) -> Result<()> {
    let mut frame = SociomeDataFrame::from_save_file(input, None)?;
    let source = source_args.load(source)?;
    let function = build_function(&source, options)?;

    frame.add_metric_to_data(function.as_ref(), options.name)?;
    let filled = frame
        .require_column(options.name)?
        .iter()
        .filter(|v| !v.is_null())
        .count();

    save_and_register(catalog, &frame, output, None)?;
    println!(
        "Added {} ({}) to {} of {} rows",
        options.name,
        function.name(),
        filled,
        frame.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::points;

    fn options(kind: MetricKind) -> MetricOptions<'static> {
        MetricOptions {
            kind,
            name: "m",
            column: None,
            subdivision: None,
            subdivision_right: None,
            radius: 1000.0,
            sigma2: None,
            precision: None,
        }
    }

    #[test]
    fn column_is_required_where_needed() {
        let source = points(&[(0.0, 0.0)]);
        assert!(build_function(&source, &options(MetricKind::Voronoi)).is_ok());
        assert!(build_function(&source, &options(MetricKind::Identity)).is_err());
        assert!(build_function(&source, &options(MetricKind::Subdivision)).is_err());
    }

    #[test]
    fn voronoi_reports_distance_in_metres() {
        let help = MetricKind::Voronoi.to_possible_value().unwrap();
        assert!(help.get_help().unwrap().to_string().contains("metres"));

        let function = build_function(&points(&[(0.0, 0.0), (5.0, 0.0)]), &options(MetricKind::Voronoi)).unwrap();
        let out = function.eval(&points(&[(0.0, 1.0)])).unwrap();
        let metres = out.column(SociomeDataFrame::METRIC_KEY).unwrap()[0].as_f64().unwrap();
        // One degree of latitude.
        assert!((metres - 110_574.0).abs() < 100.0, "{}", metres);
    }
}

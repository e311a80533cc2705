use anyhow::Result;
use clap::Parser;
use log::info;
use sociome::cli::{self, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    info!("Starting sociome");
    info!("Using catalog: {}", cli.catalog.display());

    match &cli.command {
        Commands::Load {
            input,
            source,
            output,
            name,
        } => {
            info!("Loading dataset: {}", input.display());
            cli::load::run(&cli.catalog, input, source, output, name.as_deref())
        }

        Commands::Subdivide {
            input,
            regions,
            name,
            key,
            output,
        } => {
            info!("Subdividing {} by {}", input.display(), regions.display());
            cli::subdivide::run(&cli.catalog, input, regions, name, key, output)
        }

        Commands::Link {
            input,
            other,
            columns,
            subdivision,
            right_on,
            output,
        } => {
            info!("Linking {} into {}", other.display(), input.display());
            cli::link::run(
                &cli.catalog,
                input,
                other,
                columns,
                subdivision.as_deref(),
                right_on.as_deref(),
                output,
            )
        }

        Commands::Metric {
            input,
            source,
            source_args,
            kind,
            name,
            column,
            subdivision,
            subdivision_right,
            radius,
            sigma2,
            precision,
            output,
        } => {
            info!("Computing {:?} metric from {}", kind, source.display());
            let options = cli::metric::MetricOptions {
                kind: *kind,
                name,
                column: column.as_deref(),
                subdivision: subdivision.as_deref(),
                subdivision_right: subdivision_right.as_deref(),
                radius: *radius,
                sigma2: *sigma2,
                precision: *precision,
            };
            cli::metric::run(&cli.catalog, input, source, source_args, &options, output)
        }

        Commands::Model {
            input,
            target,
            explanatory,
            alpha,
            prediction,
            residual,
            output,
            stats,
        } => {
            info!("Fitting model on {}", input.display());
            cli::model::run(
                &cli.catalog,
                input,
                target,
                explanatory,
                *alpha,
                prediction,
                residual,
                output,
                stats.as_deref(),
            )
        }

        Commands::Match {
            left,
            right,
            right_args,
            mode,
            distance,
            left_address,
            right_address,
            exact,
            min_score,
            output,
        } => {
            info!("Matching {} against {}", left.display(), right.display());
            let options = cli::matching::MatchOptions {
                mode: *mode,
                distance: *distance,
                left_address,
                right_address,
                exact,
                min_score: *min_score,
            };
            cli::matching::run(&cli.catalog, left, right, right_args, &options, output)
        }

        Commands::FindAddress { input, address, zip } => {
            info!("Looking up address in {}", input.display());
            cli::matching::find(input, address, zip.as_deref())
        }

        Commands::Render {
            input,
            columns,
            format,
            sampling_rate,
            output,
        } => {
            info!("Rendering {}", input.display());
            cli::render::run(input, columns, *format, *sampling_rate, output)
        }

        Commands::Catalog {
            init,
            stats,
            list,
            search,
            column,
            export,
            import,
        } => {
            if *init {
                info!("Initializing catalog schema");
                cli::database::init(&cli.catalog)?;
            }
            if let Some(import_path) = import {
                info!("Importing catalog from: {}", import_path.display());
                cli::database::import(&cli.catalog, import_path)?;
            }
            if let Some(export_path) = export {
                info!("Exporting catalog to: {}", export_path.display());
                cli::database::export(&cli.catalog, export_path)?;
            }
            if *list {
                cli::database::list(&cli.catalog)?;
            }
            if search.is_some() || column.is_some() {
                cli::database::search(&cli.catalog, search.as_deref(), column.as_deref())?;
            }
            if *stats {
                info!("Displaying catalog statistics");
                cli::database::stats(&cli.catalog)?;
            }
            Ok(())
        }
    }
}

//! s-expression CLI: apply a band expression to a STAC item.

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};
use log::info;
use std::path::PathBuf;

use s_expression::{
    apply_expression, stac, Algebra, Applied, EvaluationOptions, GdalEngine, Result,
};

#[derive(Parser)]
#[command(name = "s-expression")]
#[command(version, about = "Band algebra over EO acquisitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Applies s expressions to EO acquisitions
    Calculate {
        /// Input product reference (STAC item, catalog or catalog directory)
        #[arg(short = 'i', long = "input_reference")]
        input_reference: PathBuf,
        /// s expression
        #[arg(short = 's', long = "s-expression")]
        s_expression: String,
        /// Common band name of the result
        #[arg(short = 'b', long)]
        cbn: String,
        /// Assets to load, bands then bind by description
        #[arg(short = 'a', long)]
        assets: Vec<String>,
        /// JSON file with evaluation options
        #[arg(long)]
        options: Option<PathBuf>,
        /// Directory for resampled assets and the scratch raster
        #[arg(long)]
        workdir: Option<PathBuf>,
        /// Keep resampled assets
        #[arg(long)]
        keep_intermediates: bool,
    },
}

fn main() -> Result<()> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_secs();
    builder.init();

    match Cli::parse().command {
        Commands::Calculate {
            input_reference,
            s_expression,
            cbn,
            assets,
            options,
            workdir,
            keep_intermediates,
        } => {
            let mut options = match options {
                Some(path) => EvaluationOptions::from_json_file(path)?,
                None => EvaluationOptions::default(),
            };
            if let Some(workdir) = workdir {
                options.workdir = workdir;
            }
            options.keep_intermediates |= keep_intermediates;

            let item = stac::read_item(&input_reference)?;
            info!("Processing {}", item.id);
            if !assets.is_empty() {
                info!("Assets: {assets:?}");
            }

            std::fs::create_dir_all(&item.id)?;
            let cbn = cbn.replace(' ', "-");
            let file_name = format!("{cbn}.tif");
            let out_path = PathBuf::from(&item.id).join(&file_name);

            info!("Apply {s_expression} to {}", item.id);
            let applied = apply_expression(
                &GdalEngine::new(),
                &Algebra::default(),
                &item,
                &s_expression,
                &out_path,
                &assets,
                &options,
            )?;

            if let Applied::Written(_) = applied {
                stac::write_catalog(
                    &item,
                    &cbn.to_lowercase(),
                    &file_name,
                    &s_expression,
                    ".".as_ref(),
                )?;
            }
            info!("Done!");
        }
    }
    Ok(())
}

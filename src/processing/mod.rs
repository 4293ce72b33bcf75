//! From an expression and a band source to a finished raster.
//!
//! [`apply_expression`] chains the steps: identifiers are resolved to assets,
//! the assets are brought to the finest resolution among them, the expression
//! is evaluated one block at a time and the result is finalized.

pub mod finalizer;
pub mod harmonizer;
pub mod resolver;
pub mod tiled;

#[cfg(test)]
pub(crate) mod testing;

use log::{error, info};
use std::{
    collections::HashMap,
    fmt,
    hash::BuildHasher,
    path::{Path, PathBuf},
};

pub use finalizer::finalize;
pub use harmonizer::{harmonize, HarmonizedAssets};
pub use resolver::target_resolution;
pub use tiled::{evaluate_tiled, Binding, ScratchRaster};

use crate::{components::Engine, errors::Result, expression::Evaluate, options::EvaluationOptions};

/// Where the raster of a band lives.
pub trait BandLookup {
    /// Href of the asset holding `band`, `None` if the source has no such band.
    fn lookup(&self, band: &str) -> Option<String>;
}

impl<S: BuildHasher> BandLookup for HashMap<String, String, S> {
    fn lookup(&self, band: &str) -> Option<String> {
        self.get(band).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoAssetsReason {
    /// No asset list was given and the expression names no band.
    NoneSpecified,
    /// None of the listed assets could be resolved.
    NotFound(Vec<String>),
}

impl fmt::Display for NoAssetsReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoAssetsReason::NoneSpecified => write!(f, "Consider specifying assets in inputs"),
            NoAssetsReason::NotFound(_) => {
                write!(f, "Provided assets not found in item, check spelling")
            }
        }
    }
}

/// Outcome of [`apply_expression`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Written(PathBuf),
    /// Nothing to evaluate on, no file was written.
    NoAssets(NoAssetsReason),
}

/// Evaluate `expression` over the bands found through `lookup` into `out_path`.
///
/// Without `assets`, every identifier of the expression is an asset name and
/// binds the first band of that asset. With `assets`, only those are opened
/// and their bands bind by description to the identifiers.
///
/// Resolving no asset at all is not an error: it is logged and reported as
/// [`Applied::NoAssets`].
pub fn apply_expression<E, V, L>(
    engine: &E,
    evaluator: &V,
    lookup: &L,
    expression: &str,
    out_path: &Path,
    assets: &[String],
    options: &EvaluationOptions,
) -> Result<Applied>
where
    E: Engine,
    V: Evaluate + ?Sized,
    L: BandLookup + ?Sized,
{
    let identifiers = evaluator.identifiers(expression);
    let (names, binding, reason) = if assets.is_empty() {
        (identifiers, Binding::ByAsset, NoAssetsReason::NoneSpecified)
    } else {
        (
            assets.to_vec(),
            Binding::ByBandLabel(identifiers),
            NoAssetsReason::NotFound(assets.to_vec()),
        )
    };

    let Some(resolution) = target_resolution(engine, lookup, &names)? else {
        return Ok(no_assets(reason));
    };
    info!("target resolution {resolution}");

    std::fs::create_dir_all(&options.workdir)?;
    let harmonized = harmonize(engine, lookup, &names, resolution, &options.workdir)?;
    if harmonized.is_empty() {
        return Ok(no_assets(reason));
    }
    info!("Processing {} assets", harmonized.len());
    info!("Assets: {:?}", harmonized.names());

    let outcome = evaluate_tiled(
        engine,
        evaluator,
        expression,
        &harmonized,
        &binding,
        &options.scratch_path(),
    )
    .and_then(|scratch| finalize(engine, scratch, out_path, &options.output));
    if !options.keep_intermediates {
        harmonized.remove_created();
    }
    outcome?;
    Ok(Applied::Written(out_path.to_path_buf()))
}

fn no_assets(reason: NoAssetsReason) -> Applied {
    error!("No assets found");
    error!("{reason}");
    Applied::NoAssets(reason)
}

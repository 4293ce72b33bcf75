use log::info;
use std::path::Path;

use crate::{
    components::Engine, errors::Result, options::OutputOptions, processing::ScratchRaster,
};

/// Write the scratch raster to `out_path` with overviews, tiling and compression.
///
/// The scratch raster is consumed and removed from disk whether or not the
/// copy succeeds.
pub fn finalize<E: Engine>(
    engine: &E,
    mut scratch: ScratchRaster<E::Sink>,
    out_path: &Path,
    options: &OutputOptions,
) -> Result<()> {
    info!(
        "building overviews {:?} of {:?}",
        options.overview_factors,
        scratch.path()
    );
    engine.finalize(scratch.sink_mut(), out_path, options)?;
    info!("Data saved to {out_path:?}");
    Ok(())
}

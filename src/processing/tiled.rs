use log::{debug, info, warn};
use std::{
    collections::hash_map::Entry,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    components::{BlockBounds, BlockGrid, Engine, File, Sink},
    errors::{Result, SexprError},
    expression::{Context, Evaluate},
    processing::HarmonizedAssets,
};

/// How the bands of a harmonized asset are named in the evaluation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// First band, under the name of its asset.
    ByAsset,
    /// Every band whose description is one of these labels, under that label.
    ByBandLabel(Vec<String>),
}

/// Removes the file at its path when dropped.
#[derive(Debug)]
pub struct ScratchFile(PathBuf);

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.0) {
            Ok(()) => debug!("removed scratch {:?}", self.0),
            Err(error) if error.kind() == ErrorKind::NotFound => (),
            Err(error) => warn!("could not remove scratch {:?}: {error}", self.0),
        }
    }
}

/// Output of the tiled pass, deleted from disk once dropped.
#[derive(Debug)]
pub struct ScratchRaster<S: Sink> {
    // Fields drop in order: the dataset is closed before its file goes.
    sink: S,
    _file: ScratchFile,
}

impl<S: Sink> ScratchRaster<S> {
    pub fn path(&self) -> &Path {
        self.sink.path()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

/// Evaluate `expression` block by block over `assets` into a scratch raster.
///
/// Blocks follow the native block shape of the first asset. Every asset is
/// opened once per block and closed before the next one is read.
pub fn evaluate_tiled<E: Engine, V: Evaluate + ?Sized>(
    engine: &E,
    evaluator: &V,
    expression: &str,
    assets: &HarmonizedAssets,
    binding: &Binding,
    scratch_path: &Path,
) -> Result<ScratchRaster<E::Sink>> {
    let (reference_name, reference_path) = assets.reference().ok_or(SexprError::NoAssets)?;
    let reference = engine.open(reference_path)?;
    let resolution = reference.resolution()?;
    for (name, path) in assets.iter().skip(1) {
        let found = engine.open(path)?.resolution()?;
        if !found.matches(&resolution) {
            return Err(SexprError::GridMismatch {
                asset: name.to_string(),
                found,
                expected: resolution,
            });
        }
    }

    let grid = BlockGrid::new(reference.shape(), reference.block_shape()?);
    let file = ScratchFile(scratch_path.to_path_buf());
    let sink = engine.create_sink(scratch_path, &reference)?;
    drop(reference);
    let mut scratch = ScratchRaster { sink, _file: file };

    info!(
        "evaluating {expression} on the grid of {reference_name}: {:?} pixels in {} blocks of {:?}",
        grid.extent(),
        grid.len(),
        grid.block()
    );
    for bounds in &grid {
        let context = read_context(engine, assets, binding, &bounds)?;
        let block = evaluator.evaluate(expression, &context)?;
        drop(context);
        if block.dim() != bounds.array_shape() {
            return Err(SexprError::BlockShape {
                offset: bounds.offset().x_y(),
                found: block.dim(),
                expected: bounds.array_shape(),
            });
        }
        scratch.sink.write_window(&bounds, &block)?;
    }
    Ok(scratch)
}

/// Arrays of every asset for one block, first binding of a name wins.
fn read_context<E: Engine>(
    engine: &E,
    assets: &HarmonizedAssets,
    binding: &Binding,
    bounds: &BlockBounds,
) -> Result<Context> {
    let mut context = Context::new();
    for (name, path) in assets.iter() {
        let file = engine.open(path)?;
        match binding {
            Binding::ByAsset => {
                if let Entry::Vacant(entry) = context.entry(name.to_string()) {
                    entry.insert(file.read_window(0, bounds)?);
                }
            }
            Binding::ByBandLabel(labels) => {
                for index in 0..file.num_bands() {
                    let description = file.band_description(index)?;
                    if !labels.contains(&description) {
                        continue;
                    }
                    if let Entry::Vacant(entry) = context.entry(description) {
                        entry.insert(file.read_window(index, bounds)?);
                    }
                }
            }
        }
    }
    Ok(context)
}

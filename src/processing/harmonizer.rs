use itertools::Itertools;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::{
    components::{Engine, File, Resolution},
    errors::Result,
    processing::BandLookup,
};

/// Assets on a common grid, in the order they were resolved.
///
/// The first asset defines the grid of the output.
#[derive(Debug, Default)]
pub struct HarmonizedAssets {
    pub(crate) assets: Vec<(String, PathBuf)>,
    /// Resampled copies written while harmonizing.
    pub(crate) created: Vec<PathBuf>,
}

impl HarmonizedAssets {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.assets
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    pub fn reference(&self) -> Option<(&str, &Path)> {
        self.iter().next()
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn created(&self) -> &[PathBuf] {
        &self.created
    }

    /// Delete the resampled copies, originals are never touched.
    pub fn remove_created(&self) {
        for path in &self.created {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("removed {path:?}"),
                Err(error) => warn!("could not remove {path:?}: {error}"),
            }
        }
    }
}

/// Resolve `names` and bring every asset to `resolution`.
///
/// Assets already at `resolution` are referenced as they are, others are
/// resampled into `workdir` as `{name}_{resolution}.tif`.
pub fn harmonize<E: Engine, L: BandLookup + ?Sized>(
    engine: &E,
    lookup: &L,
    names: &[String],
    resolution: Resolution,
    workdir: &Path,
) -> Result<HarmonizedAssets> {
    let mut harmonized = HarmonizedAssets::default();
    for name in names.iter().unique() {
        let Some(href) = lookup.lookup(name) else {
            debug!("{name} not found, skipped");
            continue;
        };
        let file = engine.open(&href)?;
        let native = file.resolution()?;
        if native.matches(&resolution) {
            harmonized.assets.push((name.clone(), PathBuf::from(href)));
        } else {
            let path = workdir.join(format!("{name}_{resolution}.tif"));
            info!("resampling {name} from {native} to {resolution} into {path:?}");
            engine.resample(&file, &path, resolution)?;
            harmonized.created.push(path.clone());
            harmonized.assets.push((name.clone(), path));
        }
    }
    Ok(harmonized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::GdalEngine,
        processing::testing::{lookup, read_raster, write_raster},
    };
    use ndarray::{array, Array2};
    use rstest::rstest;

    #[rstest]
    fn asset_at_target_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let red = write_raster(&dir.path().join("red.tif"), 10., &[("red", Array2::ones((4, 4)))], None);
        let workdir = dir.path().join("work");
        std::fs::create_dir(&workdir).unwrap();

        let harmonized = harmonize(
            &GdalEngine::new(),
            &lookup(&[("red", &red)]),
            &["red".to_string()],
            Resolution::new(10.),
            &workdir,
        )
        .unwrap();

        assert_eq!(harmonized.reference(), Some(("red", red.as_path())));
        assert!(harmonized.created().is_empty());
        assert_eq!(std::fs::read_dir(&workdir).unwrap().count(), 0);
    }

    #[rstest]
    fn coarser_asset_is_resampled() {
        let dir = tempfile::tempdir().unwrap();
        let red = write_raster(&dir.path().join("red.tif"), 10., &[("red", Array2::ones((4, 4)))], None);
        let swir = write_raster(
            &dir.path().join("swir.tif"),
            20.,
            &[("swir", array![[1., 2.], [3., 4.]])],
            None,
        );
        let names = ["red".to_string(), "swir".to_string(), "red".to_string()];

        let harmonized = harmonize(
            &GdalEngine::new(),
            &lookup(&[("red", &red), ("swir", &swir)]),
            &names,
            Resolution::new(10.),
            dir.path(),
        )
        .unwrap();

        assert_eq!(harmonized.names(), ["red", "swir"]);
        let resampled = dir.path().join("swir_10.tif");
        assert_eq!(harmonized.created(), [resampled.clone()]);

        let (transform, data) = read_raster(&resampled);
        assert_eq!(transform.resolution(), Resolution::new(10.));
        assert_eq!(
            data,
            array![
                [1., 1., 2., 2.],
                [1., 1., 2., 2.],
                [3., 3., 4., 4.],
                [3., 3., 4., 4.]
            ]
        );

        harmonized.remove_created();
        assert!(!resampled.exists());
        assert!(swir.exists());
    }

    #[rstest]
    fn unresolved_names_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let harmonized = harmonize(
            &GdalEngine::new(),
            &lookup(&[]),
            &["nir".to_string()],
            Resolution::new(10.),
            dir.path(),
        )
        .unwrap();
        assert!(harmonized.is_empty());
        assert_eq!(harmonized.reference(), None);
    }
}

use itertools::Itertools;
use log::debug;

use crate::{
    components::{Engine, File, Resolution},
    errors::Result,
    processing::BandLookup,
};

/// Finest native resolution among the `names` that resolve to an asset.
///
/// Names the lookup does not know are skipped, `None` means none resolved.
pub fn target_resolution<E: Engine, L: BandLookup + ?Sized>(
    engine: &E,
    lookup: &L,
    names: &[String],
) -> Result<Option<Resolution>> {
    names
        .iter()
        .filter_map(|name| match lookup.lookup(name) {
            Some(href) => Some((name, href)),
            None => {
                debug!("{name} not found, skipped");
                None
            }
        })
        .map(|(name, href)| {
            let resolution = engine.open(&href)?.resolution()?;
            debug!("{name} at {href} has resolution {resolution}");
            Ok(resolution)
        })
        .process_results(|resolutions| resolutions.reduce(Resolution::min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        components::GdalEngine,
        processing::testing::{lookup, write_raster},
    };
    use ndarray::Array2;
    use rstest::rstest;

    #[rstest]
    fn finest_resolution_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_raster(&dir.path().join("a.tif"), 10., &[("a", Array2::zeros((4, 4)))], None);
        let b = write_raster(&dir.path().join("b.tif"), 20., &[("b", Array2::zeros((2, 2)))], None);
        let lookup = lookup(&[("A", &a), ("B", &b)]);

        let names = ["B".to_string(), "A".to_string()];
        assert_eq!(
            target_resolution(&GdalEngine::new(), &lookup, &names).unwrap(),
            Some(Resolution::new(10.))
        );
    }

    #[test_log::test]
    fn unknown_names_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let b = write_raster(&dir.path().join("b.tif"), 20., &[("b", Array2::zeros((2, 2)))], None);
        let lookup = lookup(&[("B", &b)]);

        let names = ["swir".to_string(), "B".to_string()];
        assert_eq!(
            target_resolution(&GdalEngine::new(), &lookup, &names).unwrap(),
            Some(Resolution::new(20.))
        );
    }

    #[rstest]
    fn nothing_resolves_is_unset() {
        let names = ["nir".to_string(), "red".to_string()];
        assert_eq!(
            target_resolution(&GdalEngine::new(), &lookup(&[]), &names).unwrap(),
            None
        );
    }
}

//! Band algebra over the raster assets of a STAC item.
//!
//! ```no_run
//! use s_expression::{apply_expression, stac, Algebra, EvaluationOptions, GdalEngine};
//!
//! let item = stac::read_item("catalog.json")?;
//! apply_expression(
//!     &GdalEngine::new(),
//!     &Algebra::default(),
//!     &item,
//!     "(/ (- nir red) (+ nir red))",
//!     "ndvi.tif".as_ref(),
//!     &[],
//!     &EvaluationOptions::default(),
//! )?;
//! # Ok::<(), s_expression::SexprError>(())
//! ```

pub mod components;
pub mod errors;
pub mod expression;
pub mod options;
pub mod processing;
pub mod stac;

use num_traits::NumCast;

pub use components::{BlockBounds, BlockGrid, Engine, File, GdalEngine, GeoTransform, Resolution, Sink};
pub use errors::{Result, SexprError};
pub use expression::{identifiers, Algebra, Evaluate, ExpressionError};
pub use options::{EvaluationOptions, OutputOptions};
pub use processing::{apply_expression, Applied, BandLookup, NoAssetsReason};

fn try_tuple_cast<TO: NumCast, TI: NumCast>(tuple: (TI, TI)) -> Result<(TO, TO)> {
    Ok((
        TO::from(tuple.0).ok_or(SexprError::Uncastable)?,
        TO::from(tuple.1).ok_or(SexprError::Uncastable)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn tuple_cast_checks_range() {
        assert_eq!(try_tuple_cast::<isize, usize>((3, 4)).unwrap(), (3, 4));
        assert!(matches!(
            try_tuple_cast::<isize, usize>((usize::MAX, 0)),
            Err(SexprError::Uncastable)
        ));
    }
}

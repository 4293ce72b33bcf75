use crate::{components::Resolution, expression::ExpressionError, stac::StacError};

pub type Result<T> = std::result::Result<T, SexprError>;

#[derive(thiserror::Error, Debug)]
pub enum SexprError {
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    Stac(#[from] StacError),
    #[error("Asset {asset} has resolution {found}, grid resolution is {expected}")]
    GridMismatch {
        asset: String,
        found: Resolution,
        expected: Resolution,
    },
    #[error("Evaluation of block at {offset:?} returned shape {found:?}, expected {expected:?}")]
    BlockShape {
        offset: (usize, usize),
        found: (usize, usize),
        expected: (usize, usize),
    },
    #[error("No asset to evaluate on")]
    NoAssets,
    #[error("Value could not be cast")]
    Uncastable,
}

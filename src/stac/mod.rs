//! Local STAC documents: where the input bands come from and how the
//! result is catalogued.

pub mod catalog;
pub mod item;
pub mod lookup;

use std::path::PathBuf;

pub use catalog::{write_catalog, COG_MEDIA_TYPE};
pub use item::{read_item, Asset, Catalog, EoBand, Item, Link, Properties, STAC_VERSION};
pub use lookup::gdal_href;

#[derive(thiserror::Error, Debug)]
pub enum StacError {
    #[error("No item found in {0:?}")]
    NoItem(PathBuf),
    #[error("{path:?} is a {found}, expected an Item, Catalog or Collection")]
    UnsupportedType { path: PathBuf, found: String },
}

use log::info;
use serde::Serialize;
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    io::BufWriter,
    path::{Path, PathBuf},
};

use crate::{
    errors::Result,
    stac::{Asset, Catalog, Item, Link, STAC_VERSION},
};

pub const COG_MEDIA_TYPE: &str = "image/tiff; application=geotiff; profile=cloud-optimized";

/// Write a self-contained catalog describing one evaluated raster.
///
/// Layout under `dir`: `catalog.json` and `{id}/{id}.json`, where the item
/// copies the identity of `source` and holds a single COG asset `asset_key`
/// pointing at `href` (relative to the item directory). Returns the path of
/// `catalog.json`.
pub fn write_catalog(
    source: &Item,
    asset_key: &str,
    href: &str,
    expression: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let id = &source.id;
    let item_dir = dir.join(id);
    std::fs::create_dir_all(&item_dir)?;

    let asset = Asset {
        href: href.to_string(),
        type_: Some(COG_MEDIA_TYPE.to_string()),
        title: None,
        roles: Some(vec!["data".to_string()]),
        eo_bands: Vec::new(),
        extra: HashMap::from([("s-expression".to_string(), Value::from(expression))]),
    };
    let item = Item {
        type_: "Feature".to_string(),
        stac_version: STAC_VERSION.to_string(),
        stac_extensions: source.stac_extensions.clone(),
        id: id.clone(),
        geometry: source.geometry.clone(),
        bbox: source.bbox.clone(),
        properties: source.properties.clone(),
        assets: BTreeMap::from([(asset_key.to_string(), asset)]),
        links: vec![
            Link::json("root", "../catalog.json"),
            Link::json("parent", "../catalog.json"),
        ],
        collection: None,
        extra: HashMap::new(),
    };
    let catalog = Catalog {
        type_: "Catalog".to_string(),
        stac_version: STAC_VERSION.to_string(),
        id: "catalog".to_string(),
        description: "s-expression".to_string(),
        links: vec![
            Link::json("root", "./catalog.json"),
            Link::json("item", format!("./{id}/{id}.json")),
        ],
    };

    write_json(&item_dir.join(format!("{id}.json")), &item)?;
    let catalog_path = dir.join("catalog.json");
    write_json(&catalog_path, &catalog)?;
    info!("catalog written to {catalog_path:?}");
    Ok(catalog_path)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let writer = BufWriter::new(std::fs::File::create(path)?);
    Ok(serde_json::to_writer_pretty(writer, value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stac::read_item;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn catalog_round_trips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let source: Item = serde_json::from_value(json!({
            "type": "Feature",
            "stac_extensions": ["https://stac-extensions.github.io/eo/v1.0.0/schema.json"],
            "id": "S2B_33PTM_20241126_0_L2A",
            "geometry": {"type": "Point", "coordinates": [14.0, 12.0]},
            "bbox": [13.9, 11.9, 14.1, 12.1],
            "properties": {"datetime": "2024-11-26T09:32:39Z"},
            "assets": {"B04": {"href": "/data/B04.tif"}}
        }))
        .unwrap();

        let catalog_path = write_catalog(
            &source,
            "ndvi",
            "NDVI.tif",
            "(/ (- nir red) (+ nir red))",
            dir.path(),
        )
        .unwrap();
        assert_eq!(catalog_path, dir.path().join("catalog.json"));

        let item = read_item(dir.path()).unwrap();
        assert_eq!(item.id, source.id);
        assert_eq!(item.bbox, source.bbox);
        assert_eq!(item.stac_extensions, source.stac_extensions);
        assert_eq!(item.assets.len(), 1);
        let asset = &item.assets["ndvi"];
        assert_eq!(
            asset.href,
            dir.path()
                .join("S2B_33PTM_20241126_0_L2A/NDVI.tif")
                .display()
                .to_string()
        );
        assert_eq!(asset.type_.as_deref(), Some(COG_MEDIA_TYPE));
        assert_eq!(asset.roles, Some(vec!["data".to_string()]));
        assert_eq!(
            asset.extra["s-expression"],
            json!("(/ (- nir red) (+ nir red))")
        );
    }
}

//! Serde models for the parts of a STAC document the tool reads and writes.

use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    io::BufReader,
    path::{Component, Path, PathBuf},
};

use crate::{errors::Result, stac::StacError};

pub const STAC_VERSION: &str = "1.0.0";

fn stac_version() -> String {
    STAC_VERSION.to_string()
}

/// A STAC Item (GeoJSON Feature).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Item {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default = "stac_version")]
    pub stac_version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    pub id: String,

    /// Geometry as raw JSON, `null` is allowed.
    pub geometry: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    pub properties: Properties,

    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,

    #[serde(default)]
    pub links: Vec<Link>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Item properties, only `eo:bands` is modelled.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Properties {
    #[serde(rename = "eo:bands", default, skip_serializing_if = "Vec::is_empty")]
    pub eo_bands: Vec<EoBand>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Asset {
    pub href: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    #[serde(rename = "eo:bands", default, skip_serializing_if = "Vec::is_empty")]
    pub eo_bands: Vec<EoBand>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Band of the EO extension.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EoBand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Link {
    pub rel: String,

    pub href: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn json(rel: &str, href: impl Into<String>) -> Self {
        Link {
            rel: rel.to_string(),
            href: href.into(),
            type_: Some("application/json".to_string()),
            title: None,
        }
    }
}

/// A STAC Catalog or Collection, reduced to what is needed to walk it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default = "stac_version")]
    pub stac_version: String,

    pub id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub links: Vec<Link>,
}

impl Catalog {
    fn first(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }
}

impl Item {
    /// Read the item at `path`, relative asset hrefs are made absolute.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut item: Item = read_json(path)?;
        let base = path.parent().unwrap_or(Path::new("."));
        for asset in item.assets.values_mut() {
            asset.href = absolute_href(base, &asset.href);
        }
        Ok(item)
    }
}

/// Item behind a local STAC reference.
///
/// `reference` is an Item, or a Catalog/Collection file (or a directory
/// holding `catalog.json`). For a catalog the first item of its first child
/// is used, falling back to the first item of the catalog itself.
pub fn read_item(reference: impl AsRef<Path>) -> Result<Item> {
    let reference = reference.as_ref();
    let path = if reference.is_dir() {
        reference.join("catalog.json")
    } else {
        reference.to_path_buf()
    };

    let document: Value = read_json(&path)?;
    match document.get("type").and_then(Value::as_str) {
        Some("Feature") => Item::from_file(&path),
        Some("Catalog") | Some("Collection") => {
            let catalog: Catalog = serde_json::from_value(document)?;
            if let Some(item) = first_child_item(&catalog, &path)? {
                return Ok(item);
            }
            let link = catalog
                .first("item")
                .ok_or_else(|| StacError::NoItem(path.clone()))?;
            Item::from_file(resolve(&path, &link.href))
        }
        found => Err(StacError::UnsupportedType {
            path,
            found: found.unwrap_or("none").to_string(),
        }
        .into()),
    }
}

fn first_child_item(catalog: &Catalog, path: &Path) -> Result<Option<Item>> {
    let Some(child) = catalog.first("child") else {
        return Ok(None);
    };
    let child_path = resolve(path, &child.href);
    let collection: Catalog = read_json(&child_path)?;
    debug!("reading first item of {}", collection.id);
    collection
        .first("item")
        .map(|link| Item::from_file(resolve(&child_path, &link.href)))
        .transpose()
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// `href` of a link found in the document at `document`.
fn resolve(document: &Path, href: &str) -> PathBuf {
    let href = href.strip_prefix("file://").unwrap_or(href);
    join(document.parent().unwrap_or(Path::new(".")), href)
}

fn join(base: &Path, href: &str) -> PathBuf {
    base.join(href)
        .components()
        .filter(|component| *component != Component::CurDir)
        .collect()
}

/// URLs and absolute paths are kept, relative paths are joined to `base`.
fn absolute_href(base: &Path, href: &str) -> String {
    if url::Url::parse(href).is_ok() || Path::new(href).is_absolute() {
        href.to_string()
    } else {
        join(base, href).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn sentinel2_item() -> Value {
        json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "stac_extensions": ["https://stac-extensions.github.io/eo/v1.0.0/schema.json"],
            "id": "S2B_33PTM_20241126_0_L2A",
            "geometry": {"type": "Point", "coordinates": [14.0, 12.0]},
            "bbox": [13.9, 11.9, 14.1, 12.1],
            "properties": {
                "datetime": "2024-11-26T09:32:39Z",
                "eo:bands": [
                    {"name": "B04", "common_name": "red"},
                    {"name": "B08", "common_name": "nir"}
                ]
            },
            "assets": {
                "B04": {"href": "B04.tif", "type": "image/tiff; application=geotiff", "roles": ["data"]},
                "B08": {"href": "https://example.com/B08.tif"},
                "SCL": {"href": "file:///data/SCL.tif"}
            },
            "links": []
        })
    }

    fn write(path: &Path, document: &Value) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string(document).unwrap()).unwrap();
    }

    fn catalog(links: Value) -> Value {
        json!({"type": "Catalog", "id": "catalog", "stac_version": "1.0.0", "description": "", "links": links})
    }

    #[rstest]
    fn item_is_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("item.json");
        write(&path, &sentinel2_item());

        let item = read_item(&path).unwrap();
        assert_eq!(item.id, "S2B_33PTM_20241126_0_L2A");
        assert_eq!(item.properties.eo_bands.len(), 2);
        assert_eq!(
            item.properties.extra["datetime"],
            json!("2024-11-26T09:32:39Z")
        );
        assert_eq!(
            item.assets["B04"].href,
            dir.path().join("B04.tif").display().to_string()
        );
        assert_eq!(item.assets["B08"].href, "https://example.com/B08.tif");
        assert_eq!(item.assets["SCL"].href, "file:///data/SCL.tif");
    }

    #[rstest]
    fn catalog_directory_uses_first_child_item() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("catalog.json"),
            &catalog(json!([
                {"rel": "child", "href": "./collection/collection.json"},
                {"rel": "item", "href": "./other/other.json"}
            ])),
        );
        write(
            &dir.path().join("collection/collection.json"),
            &json!({"type": "Collection", "id": "s2", "links": [
                {"rel": "item", "href": "./item/item.json"}
            ]}),
        );
        write(&dir.path().join("collection/item/item.json"), &sentinel2_item());

        let item = read_item(dir.path()).unwrap();
        assert_eq!(item.id, "S2B_33PTM_20241126_0_L2A");
        assert_eq!(
            item.assets["B04"].href,
            dir.path().join("collection/item/B04.tif").display().to_string()
        );
    }

    #[rstest]
    fn catalog_without_children_uses_own_item() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        write(&path, &catalog(json!([{"rel": "item", "href": "./item/item.json"}])));
        write(&dir.path().join("item/item.json"), &sentinel2_item());

        assert_eq!(read_item(&path).unwrap().id, "S2B_33PTM_20241126_0_L2A");
    }

    #[rstest]
    fn empty_catalog_has_no_item() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("catalog.json"), &catalog(json!([])));
        assert!(matches!(
            read_item(dir.path()),
            Err(crate::SexprError::Stac(StacError::NoItem(_)))
        ));
    }

    #[rstest]
    fn unknown_document_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.json");
        write(&path, &json!({"type": "FeatureCollection", "features": []}));
        assert!(matches!(
            read_item(&path),
            Err(crate::SexprError::Stac(StacError::UnsupportedType { ref found, .. })) if found == "FeatureCollection"
        ));
    }
}

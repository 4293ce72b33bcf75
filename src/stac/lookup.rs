use url::Url;

use crate::{
    processing::BandLookup,
    stac::{Asset, Item},
};

impl Item {
    /// Asset holding `band`, by EO common name first, then by asset key.
    ///
    /// Common names are looked up in the item `eo:bands`, whose `name` is the
    /// asset key, then in the `eo:bands` of each asset.
    pub fn asset(&self, band: &str) -> Option<&Asset> {
        self.by_common_name(band)
            .or_else(|| self.assets.get(band))
    }

    /// Href of the asset holding `band`, readable by GDAL.
    pub fn asset_href(&self, band: &str) -> Option<String> {
        self.asset(band).map(|asset| gdal_href(&asset.href))
    }

    fn by_common_name(&self, band: &str) -> Option<&Asset> {
        let is_band = |common_name: &Option<String>| common_name.as_deref() == Some(band);
        self.properties
            .eo_bands
            .iter()
            .find(|eo_band| is_band(&eo_band.common_name))
            .and_then(|eo_band| eo_band.name.as_ref())
            .and_then(|name| self.assets.get(name))
            .or_else(|| {
                self.assets
                    .values()
                    .find(|asset| asset.eo_bands.iter().any(|eo_band| is_band(&eo_band.common_name)))
            })
    }
}

impl BandLookup for Item {
    fn lookup(&self, band: &str) -> Option<String> {
        self.asset_href(band)
    }
}

/// Remote hrefs go through `/vsicurl/`, `file://` URLs become plain paths.
pub fn gdal_href(href: &str) -> String {
    match Url::parse(href) {
        Ok(url) if url.scheme().starts_with("http") => format!("/vsicurl/{href}"),
        Ok(url) if url.scheme() == "file" => href.replacen("file://", "", 1),
        _ => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn item() -> Item {
        serde_json::from_value(json!({
            "type": "Feature",
            "id": "S2B_33PTM_20241126_0_L2A",
            "geometry": null,
            "properties": {
                "eo:bands": [
                    {"name": "B04", "common_name": "red"},
                    {"name": "B08", "common_name": "nir"}
                ]
            },
            "assets": {
                "B04": {"href": "/data/B04.tif"},
                "B08": {"href": "https://example.com/B08.tif"},
                "swir16": {"href": "file:///data/B11.tif", "eo:bands": [{"name": "B11", "common_name": "swir16"}]},
                "visual": {"href": "/data/TCI.tif", "eo:bands": [{"name": "B04", "common_name": "red"}]},
                "SCL": {"href": "s3://bucket/SCL.tif"}
            }
        }))
        .unwrap()
    }

    #[rstest]
    #[case("red", Some("/data/B04.tif"))]
    #[case("nir", Some("/vsicurl/https://example.com/B08.tif"))]
    #[case("B04", Some("/data/B04.tif"))]
    #[case("swir16", Some("/data/B11.tif"))]
    #[case("SCL", Some("s3://bucket/SCL.tif"))]
    #[case("coastal", None)]
    fn band_resolves_to_href(#[case] band: &str, #[case] expected: Option<&str>) {
        assert_eq!(item().lookup(band).as_deref(), expected);
    }

    #[rstest]
    #[case("http://host/a.tif", "/vsicurl/http://host/a.tif")]
    #[case("https://host/a.tif", "/vsicurl/https://host/a.tif")]
    #[case("file:///tmp/a.tif", "/tmp/a.tif")]
    #[case("/tmp/a.tif", "/tmp/a.tif")]
    #[case("relative/a.tif", "relative/a.tif")]
    fn hrefs_are_made_readable(#[case] href: &str, #[case] expected: &str) {
        assert_eq!(gdal_href(href), expected);
    }
}

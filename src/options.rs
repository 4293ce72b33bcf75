use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Settings of one evaluation pass.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```json
/// { "workdir": "/tmp/s-expression", "output": { "compression": "ZSTD" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Directory receiving resampled assets and the scratch raster.
    pub workdir: PathBuf,
    /// File name of the scratch raster inside `workdir`.
    pub scratch_name: String,
    /// Keep resampled assets after the pass instead of removing them.
    pub keep_intermediates: bool,
    pub output: OutputOptions,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            scratch_name: "temp.tif".into(),
            keep_intermediates: false,
            output: OutputOptions::default(),
        }
    }
}

impl EvaluationOptions {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = std::io::BufReader::new(std::fs::File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.workdir.join(&self.scratch_name)
    }
}

/// Layout of the final raster.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    pub overview_factors: Vec<i32>,
    pub overview_resampling: String,
    pub compression: String,
    pub tiled: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            overview_factors: vec![2, 4, 8, 16, 32, 64],
            overview_resampling: "NEAREST".into(),
            compression: "DEFLATE".into(),
            tiled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn partial_document_keeps_defaults() {
        let options: EvaluationOptions = serde_json::from_str(
            r#"{ "workdir": "/tmp/work", "output": { "compression": "ZSTD" } }"#,
        )
        .unwrap();
        assert_eq!(options.workdir, PathBuf::from("/tmp/work"));
        assert_eq!(options.scratch_path(), PathBuf::from("/tmp/work/temp.tif"));
        assert!(!options.keep_intermediates);
        assert_eq!(options.output.compression, "ZSTD");
        assert_eq!(options.output.overview_factors, vec![2, 4, 8, 16, 32, 64]);
        assert!(options.output.tiled);
    }
}

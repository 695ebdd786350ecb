use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

pub const SUPPORTED_MANIFEST_VERSION: u64 = 1;
const MANIFEST_VERSION_KEY: &str = "manifestVersion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontsManifest {
    pub atlas: PathBuf,
    pub grid_size: GridSize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InputMapping {
    pub keys: Vec<String>,
    pub address: u32,
}

impl InputMapping {
    pub fn is_triggered_by(&self, key: &str) -> bool {
        self.keys.iter().any(|candidate| candidate == key)
    }
}

/// Wire shape of a version 1 manifest. `manifestVersion` is checked on the raw
/// JSON before this is decoded, so newer manifests fail with a version error
/// instead of a schema error.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ManifestV1 {
    pub program: String,
    pub fonts: FontsManifest,
    pub palette: Vec<String>,
    #[serde(default)]
    pub input_mappings: Vec<InputMapping>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub source_path: PathBuf,
    pub program: String,
    pub fonts: FontsManifest,
    pub palette: Palette,
    pub input_mappings: Vec<InputMapping>,
}

impl Manifest {
    pub fn cell_size(&self) -> GridSize {
        self.fonts.grid_size
    }

    pub fn font_atlas_path(&self) -> PathBuf {
        let base_dir = self.source_path.parent().unwrap_or_else(|| Path::new(""));
        base_dir.join(&self.fonts.atlas)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 4]>,
}

impl Palette {
    pub fn new(colors: Vec<[u8; 4]>) -> Option<Self> {
        if colors.is_empty() {
            return None;
        }
        Some(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Indices past the end wrap around.
    pub fn color(&self, index: u8) -> [u8; 4] {
        self.colors[index as usize % self.colors.len()]
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest {path} is not valid json: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest {path} does not match the version 1 schema: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
    #[error("manifest version not specified in {path}")]
    VersionMissing { path: PathBuf },
    #[error("only manifest version {supported} is supported, {path} declares {found}")]
    UnsupportedVersion {
        path: PathBuf,
        found: String,
        supported: u64,
    },
    #[error("font grid size must be non-zero, got {width}x{height}")]
    InvalidGridSize { width: u32, height: u32 },
    #[error("manifest palette is empty")]
    EmptyPalette,
    #[error("palette entry {index} is not a #rrggbb or #rrggbbaa color: {value:?}")]
    InvalidPaletteEntry { index: usize, value: String },
}

pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let raw = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match parse_manifest(path, &raw) {
        Ok(manifest) => {
            info!(
                path = %path.display(),
                program = manifest.program.as_str(),
                cell_width = manifest.fonts.grid_size.width,
                cell_height = manifest.fonts.grid_size.height,
                palette_len = manifest.palette.len(),
                input_mappings = manifest.input_mappings.len(),
                "manifest_loaded"
            );
            Ok(manifest)
        }
        Err(err) => {
            error!(
                path = %path.display(),
                error = %err,
                manifest = raw.as_str(),
                "manifest_rejected"
            );
            Err(err)
        }
    }
}

pub fn parse_manifest(path: &Path, raw: &str) -> Result<Manifest, ManifestError> {
    let value: Value = serde_json::from_str(raw).map_err(|source| ManifestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    check_manifest_version(path, &value)?;

    let parsed: ManifestV1 =
        serde_path_to_error::deserialize(&value).map_err(|source| ManifestError::Schema {
            path: path.to_path_buf(),
            source,
        })?;

    let grid_size = parsed.fonts.grid_size;
    if grid_size.width == 0 || grid_size.height == 0 {
        return Err(ManifestError::InvalidGridSize {
            width: grid_size.width,
            height: grid_size.height,
        });
    }

    Ok(Manifest {
        source_path: path.to_path_buf(),
        program: parsed.program,
        fonts: parsed.fonts,
        palette: parse_palette(&parsed.palette)?,
        input_mappings: parsed.input_mappings,
    })
}

fn check_manifest_version(path: &Path, value: &Value) -> Result<(), ManifestError> {
    match value.get(MANIFEST_VERSION_KEY) {
        None | Some(Value::Null) => Err(ManifestError::VersionMissing {
            path: path.to_path_buf(),
        }),
        Some(version) if version.as_u64() == Some(SUPPORTED_MANIFEST_VERSION) => Ok(()),
        Some(version) => Err(ManifestError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: version.to_string(),
            supported: SUPPORTED_MANIFEST_VERSION,
        }),
    }
}

fn parse_palette(entries: &[String]) -> Result<Palette, ManifestError> {
    let colors = entries
        .iter()
        .enumerate()
        .map(|(index, value)| {
            parse_hex_color(value).ok_or_else(|| ManifestError::InvalidPaletteEntry {
                index,
                value: value.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Palette::new(colors).ok_or(ManifestError::EmptyPalette)
}

fn parse_hex_color(value: &str) -> Option<[u8; 4]> {
    let hex = value.strip_prefix('#')?;
    if !hex.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |index: usize| u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16).ok();
    match hex.len() {
        6 => Some([channel(0)?, channel(1)?, channel(2)?, 255]),
        8 => Some([channel(0)?, channel(1)?, channel(2)?, channel(3)?]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    fn manifest_json(version: Value) -> Value {
        json!({
            "manifestVersion": version,
            "program": "builtin:console",
            "fonts": { "atlas": "font.png", "gridSize": { "width": 8, "height": 12 } },
            "palette": ["#000000", "#c0c0c0", "#00ff0080"],
            "inputMappings": [
                { "keys": ["w", "ArrowUp"], "address": 5 },
                { "keys": [" "], "address": 9 }
            ]
        })
    }

    fn parse(value: &Value) -> Result<Manifest, ManifestError> {
        parse_manifest(Path::new("assets/manifest.json"), &value.to_string())
    }

    #[test]
    fn version_one_manifest_parses_all_consumed_fields() {
        let manifest = parse(&manifest_json(json!(1))).expect("manifest");

        assert_eq!(manifest.program, "builtin:console");
        assert_eq!(manifest.cell_size(), GridSize { width: 8, height: 12 });
        assert_eq!(manifest.palette.len(), 3);
        assert_eq!(manifest.palette.color(2), [0, 255, 0, 128]);
        assert_eq!(manifest.input_mappings.len(), 2);
        assert!(manifest.input_mappings[0].is_triggered_by("ArrowUp"));
        assert!(!manifest.input_mappings[0].is_triggered_by("s"));
        assert_eq!(
            manifest.font_atlas_path(),
            Path::new("assets").join("font.png")
        );
    }

    #[test]
    fn missing_version_is_rejected() {
        let mut value = manifest_json(json!(1));
        value
            .as_object_mut()
            .expect("object")
            .remove(MANIFEST_VERSION_KEY);

        let err = parse(&value).expect_err("missing version must fail");
        assert!(matches!(err, ManifestError::VersionMissing { .. }));
    }

    #[test]
    fn null_version_is_rejected_as_missing() {
        let err = parse(&manifest_json(Value::Null)).expect_err("null version must fail");
        assert!(matches!(err, ManifestError::VersionMissing { .. }));
    }

    #[test]
    fn newer_version_is_rejected_before_schema_checks() {
        let value = json!({ "manifestVersion": 2, "somethingNew": true });

        let err = parse(&value).expect_err("version 2 must fail");
        match err {
            ManifestError::UnsupportedVersion { found, .. } => assert_eq!(found, "2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn version_zero_is_rejected() {
        let err = parse(&manifest_json(json!(0))).expect_err("version 0 must fail");
        assert!(matches!(err, ManifestError::UnsupportedVersion { .. }));
    }

    #[test]
    fn schema_errors_report_the_json_path() {
        let mut value = manifest_json(json!(1));
        value["fonts"]["gridSize"]["width"] = json!("wide");

        let err = parse(&value).expect_err("bad width must fail");
        match err {
            ManifestError::Schema { source, .. } => {
                assert_eq!(source.path().to_string(), "fonts.gridSize.width");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_grid_size_is_rejected() {
        let mut value = manifest_json(json!(1));
        value["fonts"]["gridSize"]["height"] = json!(0);

        let err = parse(&value).expect_err("zero height must fail");
        assert!(matches!(
            err,
            ManifestError::InvalidGridSize {
                width: 8,
                height: 0
            }
        ));
    }

    #[test]
    fn bad_palette_entry_reports_its_index() {
        let mut value = manifest_json(json!(1));
        value["palette"] = json!(["#000000", "red"]);

        let err = parse(&value).expect_err("bad palette must fail");
        assert!(matches!(
            err,
            ManifestError::InvalidPaletteEntry { index: 1, .. }
        ));
    }

    #[test]
    fn empty_palette_is_rejected() {
        let mut value = manifest_json(json!(1));
        value["palette"] = json!([]);

        let err = parse(&value).expect_err("empty palette must fail");
        assert!(matches!(err, ManifestError::EmptyPalette));
    }

    #[test]
    fn input_mappings_default_to_empty() {
        let mut value = manifest_json(json!(1));
        value
            .as_object_mut()
            .expect("object")
            .remove("inputMappings");

        let manifest = parse(&value).expect("manifest");
        assert!(manifest.input_mappings.is_empty());
    }

    #[test]
    fn palette_index_wraps_past_the_end() {
        let palette = Palette::new(vec![[1, 1, 1, 255], [2, 2, 2, 255]]).expect("palette");
        assert_eq!(palette.color(3), [2, 2, 2, 255]);
    }

    #[test]
    fn hex_color_parsing_rejects_malformed_values() {
        assert_eq!(parse_hex_color("#0a0B0c"), Some([10, 11, 12, 255]));
        assert_eq!(parse_hex_color("0a0b0c"), None);
        assert_eq!(parse_hex_color("#0a0b0"), None);
        assert_eq!(parse_hex_color("#zz0000"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
    }

    #[test]
    fn load_manifest_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manifest.json");
        let mut file = fs::File::create(&path).expect("create");
        file.write_all(manifest_json(json!(1)).to_string().as_bytes())
            .expect("write");

        let manifest = load_manifest(&path).expect("manifest");
        assert_eq!(manifest.source_path, path);
        assert_eq!(manifest.font_atlas_path(), dir.path().join("font.png"));
    }

    #[test]
    fn load_manifest_fails_for_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_manifest(&dir.path().join("absent.json")).expect_err("missing file");
        assert!(matches!(err, ManifestError::Read { .. }));
    }

    #[test]
    fn load_manifest_rejects_unsupported_version_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("manifest.json");
        fs::write(&path, manifest_json(json!(2)).to_string()).expect("write");

        let err = load_manifest(&path).expect_err("version 2 must fail");
        assert!(matches!(err, ManifestError::UnsupportedVersion { .. }));
    }
}

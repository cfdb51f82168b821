//! Region boundary loading from GeoJSON.

use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson};
use log::info;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoundaryError {
    #[error("Failed to open boundary file {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("GeoJSON must be a FeatureCollection")]
    NotACollection,
    #[error("Feature {index} has no '{property}' property")]
    MissingCode { index: usize, property: String },
    #[error("Feature {index} has no geometry")]
    MissingGeometry { index: usize },
    #[error("Feature {index} is not a polygon or multipolygon")]
    NotAreal { index: usize },
    #[error("Region code '{code}' is used by more than one feature (feature {index})")]
    DuplicateCode { code: String, index: usize },
}

/// One region outline keyed by its code.
#[derive(Debug, Clone)]
pub struct Boundary {
    pub code: String,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

/// Load every feature of a FeatureCollection, keyed by `code_property`.
pub fn load_boundaries(path: &Path, code_property: &str) -> Result<Vec<Boundary>, BoundaryError> {
    let file = File::open(path).map_err(|source| BoundaryError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson = GeoJson::from_reader(BufReader::new(file))?;

    let boundaries = boundaries_from_geojson(geojson, code_property)?;
    info!("Loaded {} boundaries from {:?}", boundaries.len(), path);
    Ok(boundaries)
}

pub fn boundaries_from_geojson(
    geojson: GeoJson,
    code_property: &str,
) -> Result<Vec<Boundary>, BoundaryError> {
    let collection: FeatureCollection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(BoundaryError::NotACollection),
    };

    let mut boundaries = Vec::with_capacity(collection.features.len());
    let mut seen: HashSet<String> = HashSet::new();

    for (index, feature) in collection.features.into_iter().enumerate() {
        let properties = feature.properties.as_ref();

        // Codes may be written as strings or bare numbers.
        let code = match properties.and_then(|props| props.get(code_property)) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(BoundaryError::MissingCode {
                    index,
                    property: code_property.to_string(),
                })
            }
        };

        if !seen.insert(code.clone()) {
            return Err(BoundaryError::DuplicateCode { code, index });
        }

        let name = properties
            .and_then(|props| props.get("nom").or_else(|| props.get("name")))
            .and_then(Value::as_str)
            .map(str::to_string);

        let geometry = feature
            .geometry
            .ok_or(BoundaryError::MissingGeometry { index })?;
        let geometry: geo::Geometry<f64> = geometry
            .value
            .try_into()
            .map_err(|_| BoundaryError::NotAreal { index })?;

        let geometry = match geometry {
            geo::Geometry::MultiPolygon(mp) => mp,
            geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
            _ => return Err(BoundaryError::NotAreal { index }),
        };

        boundaries.push(Boundary {
            code,
            name,
            geometry,
        });
    }

    Ok(boundaries)
}

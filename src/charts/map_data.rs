//! Map Data Module
//! Joins region results to their boundaries and computes the Choice A ratio.

use crate::data::columns::*;
use crate::data::Boundary;
use crate::stats::RegionResult;
use geo::MultiPolygon;
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("No boundary found for region '{0}'")]
    MissingGeometry(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// One shaded region of the map.
#[derive(Debug, Clone)]
pub struct MapRow {
    pub result: RegionResult,
    pub geometry: MultiPolygon<f64>,
    /// Choice A share of expressed votes; NaN when nothing was expressed.
    pub ratio: f64,
}

/// Choice A over Choice A plus Choice B. 0/0 yields NaN.
pub fn choice_a_ratio(choice_a: i64, choice_b: i64) -> f64 {
    choice_a as f64 / (choice_a + choice_b) as f64
}

/// The final table: every region result with its outline and ratio.
#[derive(Debug, Clone, Default)]
pub struct MapTable {
    pub rows: Vec<MapRow>,
}

impl MapTable {
    /// Inner join on region code, in boundary order.
    ///
    /// Boundaries without a result are dropped. A result without a boundary
    /// is an error.
    pub fn join(results: Vec<RegionResult>, boundaries: Vec<Boundary>) -> Result<Self, MapError> {
        let mut by_code: HashMap<String, RegionResult> = results
            .into_iter()
            .map(|r| (r.region_code.clone(), r))
            .collect();

        let mut rows = Vec::with_capacity(by_code.len());
        for boundary in boundaries {
            let Some(result) = by_code.remove(&boundary.code) else {
                debug!(
                    "No results for boundary '{}' ({}), skipping",
                    boundary.code,
                    boundary.name.as_deref().unwrap_or("unnamed")
                );
                continue;
            };
            let ratio = choice_a_ratio(result.choice_a_votes, result.choice_b_votes);
            rows.push(MapRow {
                result,
                geometry: boundary.geometry,
                ratio,
            });
        }

        if let Some(code) = by_code.keys().min() {
            return Err(MapError::MissingGeometry(code.clone()));
        }

        info!("Joined {} regions to their boundaries", rows.len());
        Ok(Self { rows })
    }

    pub fn ratio_of(&self, region_code: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.result.region_code == region_code)
            .map(|row| row.ratio)
    }

    /// The table without geometry, with its `ratio` column.
    pub fn to_frame(&self) -> Result<DataFrame, MapError> {
        let r = |f: fn(&RegionResult) -> i64| -> Vec<i64> {
            self.rows.iter().map(|row| f(&row.result)).collect()
        };

        let df = DataFrame::new(vec![
            Column::new(
                REGION_CODE.into(),
                self.rows.iter().map(|row| row.result.region_code.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                REGION_NAME.into(),
                self.rows.iter().map(|row| row.result.region_name.clone()).collect::<Vec<_>>(),
            ),
            Column::new(REGISTERED.into(), r(|x| x.registered_count)),
            Column::new(ABSTENTIONS.into(), r(|x| x.abstentions)),
            Column::new(NULL_VOTES.into(), r(|x| x.null_votes)),
            Column::new(CHOICE_A.into(), r(|x| x.choice_a_votes)),
            Column::new(CHOICE_B.into(), r(|x| x.choice_b_votes)),
            Column::new(
                RATIO.into(),
                self.rows.iter().map(|row| row.ratio).collect::<Vec<f64>>(),
            ),
        ])?;

        Ok(df)
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), MapError> {
        let mut df = self.to_frame()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| MapError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let mut file = File::create(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        info!("Wrote region table to {:?}", path);
        Ok(())
    }
}

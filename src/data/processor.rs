//! Data Processor Module
//! Builds the area table and attaches region identity to every ballot row.

use crate::data::columns::*;
use log::{debug, info, warn};
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Number of leading department rows whose codes are rewritten to "1".."9".
pub const PADDED_DEPARTMENT_ROWS: usize = 9;

// Keeps department file order through the join.
const ROW_INDEX: &str = "__department_row";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Region code '{0}' appears more than once in the region table")]
    DuplicateRegionCode(String),
    #[error("Department code '{0}' appears more than once in the area table")]
    DuplicateDepartmentCode(String),
    #[error("Referendum table has {found} columns, expected {expected}")]
    ColumnCount { expected: usize, found: usize },
}

/// Handles the joins between the referendum and the reference tables.
pub struct DataProcessor;

impl DataProcessor {
    /// Left join departments to regions on region code.
    ///
    /// Output columns: [region_code, region_name, department_code, department_name],
    /// one row per department in file order. Departments whose region is unknown
    /// keep a null region_name.
    pub fn merge_regions_and_departments(
        regions: &DataFrame,
        departments: &DataFrame,
    ) -> Result<DataFrame, ProcessorError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for code in regions.column("code")?.str()?.into_iter().flatten() {
            if !seen.insert(code) {
                return Err(ProcessorError::DuplicateRegionCode(code.to_string()));
            }
        }

        let regions = regions
            .clone()
            .lazy()
            .select([col("code").alias(REGION_CODE), col("name").alias(REGION_NAME)]);

        let area_columns: Vec<Expr> = AREA_COLUMNS.iter().map(|name| col(*name)).collect();

        let mut area = departments
            .clone()
            .lazy()
            .select([
                col("region_code").alias(REGION_CODE),
                col("code").alias(DEPARTMENT_CODE),
                col("name").alias(DEPARTMENT_NAME),
            ])
            .with_row_index(ROW_INDEX, None)
            .join(
                regions,
                [col(REGION_CODE)],
                [col(REGION_CODE)],
                JoinArgs::new(JoinType::Left),
            )
            .sort_by_exprs([col(ROW_INDEX)], SortMultipleOptions::default())
            .select(area_columns)
            .collect()?;

        let mut codes: Vec<Option<String>> = area
            .column(DEPARTMENT_CODE)?
            .str()?
            .into_iter()
            .map(|code| code.map(str::to_string))
            .collect();
        normalize_leading_department_codes(&mut codes);

        {
            let mut seen: HashSet<&str> = HashSet::new();
            for code in codes.iter().flatten() {
                if !seen.insert(code.as_str()) {
                    return Err(ProcessorError::DuplicateDepartmentCode(code.clone()));
                }
            }
        }

        area.with_column(Series::new(DEPARTMENT_CODE.into(), codes))?;

        info!("Area table: {} departments", area.height());
        debug!("{}", area);

        Ok(area)
    }

    /// Drop ballots outside the area table (overseas, abroad) and attach region identity.
    ///
    /// Output columns: the canonical ballot columns followed by region_code, region_name.
    pub fn merge_referendum_and_areas(
        referendum: &DataFrame,
        area: &DataFrame,
    ) -> Result<DataFrame, ProcessorError> {
        let ballots = Self::canonical_ballots(referendum)?;

        let known: HashSet<&str> = area
            .column(DEPARTMENT_CODE)?
            .str()?
            .into_iter()
            .flatten()
            .collect();

        let mask: BooleanChunked = ballots
            .column(DEPARTMENT_CODE)?
            .str()?
            .into_iter()
            .map(|code| code.is_some_and(|c| known.contains(c)))
            .collect();

        let kept = ballots.filter(&mask)?;
        info!(
            "Kept {} of {} ballot rows with a mainland department",
            kept.height(),
            ballots.height()
        );

        let area_keys = area
            .clone()
            .lazy()
            .select([col(DEPARTMENT_CODE), col(REGION_CODE), col(REGION_NAME)]);

        let joined = kept
            .lazy()
            .join(
                area_keys,
                [col(DEPARTMENT_CODE)],
                [col(DEPARTMENT_CODE)],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?;

        debug!("{}", joined);
        Ok(joined)
    }

    /// Overwrite the raw headers positionally and cast the vote counts to Int64.
    fn canonical_ballots(referendum: &DataFrame) -> Result<DataFrame, ProcessorError> {
        if referendum.width() != BALLOT_COLUMNS.len() {
            return Err(ProcessorError::ColumnCount {
                expected: BALLOT_COLUMNS.len(),
                found: referendum.width(),
            });
        }

        let renamed: Vec<Column> = referendum
            .get_columns()
            .iter()
            .zip(BALLOT_COLUMNS)
            .map(|(column, name)| column.clone().with_name(name.into()))
            .collect();

        let counts: Vec<Expr> = COUNT_COLUMNS
            .iter()
            .map(|name| col(*name).strict_cast(DataType::Int64))
            .collect();

        let ballots = DataFrame::new(renamed)?
            .lazy()
            .with_columns(counts)
            .collect()?;

        Ok(ballots)
    }
}

/// Rewrite the first nine department codes to "1".."9".
///
/// The department file stores these codes zero-padded ("01".."09") while the
/// referendum file does not. This patches exactly those rows of this dataset;
/// it is not a general padding rule. A warning is logged when a rewritten value
/// is not the padded form of its replacement, which means the input encoding
/// has changed and this correction needs revisiting.
pub fn normalize_leading_department_codes(codes: &mut [Option<String>]) {
    for (i, code) in codes.iter_mut().take(PADDED_DEPARTMENT_ROWS).enumerate() {
        let replacement = (i + 1).to_string();

        let matches_padded = code
            .as_deref()
            .is_some_and(|c| c.trim_start_matches('0') == replacement);
        if !matches_padded {
            warn!(
                "Department row {} has code {:?}, rewriting it to '{}'",
                i, code, replacement
            );
        }

        *code = Some(replacement);
    }
}

//! Region Aggregator Module
//! Sums ballot counts per region.

use crate::data::columns::*;
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Region '{code}' is named both {first:?} and {second:?}")]
    ConflictingRegionName {
        code: String,
        first: Option<String>,
        second: Option<String>,
    },
    #[error("Null value in column '{0}' of the region results")]
    NullValue(&'static str),
}

/// Absolute counts for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionResult {
    pub region_code: String,
    pub region_name: Option<String>,
    pub registered_count: i64,
    pub abstentions: i64,
    pub null_votes: i64,
    pub choice_a_votes: i64,
    pub choice_b_votes: i64,
}

impl RegionResult {
    /// Read typed rows back out of an aggregate frame.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<RegionResult>, AggregateError> {
        let codes = df.column(REGION_CODE)?.str()?;
        let names = df.column(REGION_NAME)?.str()?;
        let registered = df.column(REGISTERED)?.i64()?;
        let abstentions = df.column(ABSTENTIONS)?.i64()?;
        let null_votes = df.column(NULL_VOTES)?.i64()?;
        let choice_a = df.column(CHOICE_A)?.i64()?;
        let choice_b = df.column(CHOICE_B)?.i64()?;

        (0..df.height())
            .map(|i| -> Result<RegionResult, AggregateError> {
                Ok(RegionResult {
                    region_code: codes
                        .get(i)
                        .ok_or(AggregateError::NullValue(REGION_CODE))?
                        .to_string(),
                    region_name: names.get(i).map(str::to_string),
                    registered_count: registered.get(i).ok_or(AggregateError::NullValue(REGISTERED))?,
                    abstentions: abstentions.get(i).ok_or(AggregateError::NullValue(ABSTENTIONS))?,
                    null_votes: null_votes.get(i).ok_or(AggregateError::NullValue(NULL_VOTES))?,
                    choice_a_votes: choice_a.get(i).ok_or(AggregateError::NullValue(CHOICE_A))?,
                    choice_b_votes: choice_b.get(i).ok_or(AggregateError::NullValue(CHOICE_B))?,
                })
            })
            .collect()
    }
}

/// Handles the group-by over joined ballots.
pub struct ResultAggregator;

impl ResultAggregator {
    /// Group ballots by region code and sum the vote counts.
    ///
    /// Output columns: [region_code, region_name, registered_count, abstentions,
    /// null_votes, choice_a_votes, choice_b_votes], one row per region, sorted
    /// by region_code.
    pub fn by_region(ballots: &DataFrame) -> Result<DataFrame, AggregateError> {
        let names = Self::region_names(ballots)?;

        let mut aggs = vec![col(REGION_NAME).first()];
        aggs.extend(COUNT_COLUMNS.iter().map(|name| col(*name).sum()));

        let result = ballots
            .clone()
            .lazy()
            .group_by([col(REGION_CODE)])
            .agg(aggs)
            .sort_by_exprs([col(REGION_CODE)], SortMultipleOptions::default())
            .collect()?;

        info!("Aggregated ballots into {} regions", names.len());
        debug!("{}", result);

        Ok(result)
    }

    /// The region_code -> region_name mapping, which must be a function.
    pub fn region_names(
        ballots: &DataFrame,
    ) -> Result<HashMap<String, Option<String>>, AggregateError> {
        let codes = ballots.column(REGION_CODE)?.str()?;
        let names = ballots.column(REGION_NAME)?.str()?;

        let mut mapping: HashMap<String, Option<String>> = HashMap::new();
        for (code, name) in codes.into_iter().zip(names.into_iter()) {
            let Some(code) = code else { continue };
            match mapping.get(code) {
                Some(existing) if existing.as_deref() != name => {
                    return Err(AggregateError::ConflictingRegionName {
                        code: code.to_string(),
                        first: existing.clone(),
                        second: name.map(str::to_string),
                    });
                }
                Some(_) => {}
                None => {
                    mapping.insert(code.to_string(), name.map(str::to_string));
                }
            }
        }

        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ballots() -> DataFrame {
        df!(
            DEPARTMENT_CODE => ["1", "1", "2", "75", "77"],
            REGISTERED => [100i64, 50, 25, 1000, 400],
            ABSTENTIONS => [10i64, 5, 2, 300, 100],
            NULL_VOTES => [1i64, 0, 1, 20, 5],
            CHOICE_A => [60i64, 20, 10, 400, 150],
            CHOICE_B => [29i64, 25, 12, 280, 145],
            REGION_CODE => ["84", "84", "84", "11", "11"],
            REGION_NAME => ["Auvergne", "Auvergne", "Auvergne", "Ile-de-France", "Ile-de-France"]
        )
        .unwrap()
    }

    #[test]
    fn sums_counts_per_region() {
        let result = ResultAggregator::by_region(&ballots()).unwrap();
        let rows = RegionResult::from_frame(&result).unwrap();

        assert_eq!(
            rows,
            vec![
                RegionResult {
                    region_code: "11".into(),
                    region_name: Some("Ile-de-France".into()),
                    registered_count: 1400,
                    abstentions: 400,
                    null_votes: 25,
                    choice_a_votes: 550,
                    choice_b_votes: 425,
                },
                RegionResult {
                    region_code: "84".into(),
                    region_name: Some("Auvergne".into()),
                    registered_count: 175,
                    abstentions: 17,
                    null_votes: 2,
                    choice_a_votes: 90,
                    choice_b_votes: 66,
                },
            ]
        );
    }

    #[test]
    fn totals_are_conserved_and_codes_unique() {
        let input = ballots();
        let result = ResultAggregator::by_region(&input).unwrap();

        let before = input.column(REGISTERED).unwrap().i64().unwrap().sum();
        let after = result.column(REGISTERED).unwrap().i64().unwrap().sum();
        assert_eq!(before, after);

        let codes = result.column(REGION_CODE).unwrap();
        assert_eq!(codes.n_unique().unwrap(), result.height());
    }

    #[test]
    fn conflicting_region_names_fail_loudly() {
        let mut input = ballots();
        input
            .replace(
                REGION_NAME,
                Series::new(
                    REGION_NAME.into(),
                    ["Auvergne", "Rhone-Alpes", "Auvergne", "Ile-de-France", "Ile-de-France"],
                ),
            )
            .unwrap();

        let err = ResultAggregator::by_region(&input).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::ConflictingRegionName { ref code, .. } if code == "84"
        ));
    }
}

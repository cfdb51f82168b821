//! CSV Data Loader Module
//! Reads the referendum, region and department files into Polars DataFrames.

use crate::config::InputConfig;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Input file not found: {0:?}")]
    MissingFile(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Column '{column}' missing from {path:?}")]
    MissingColumn { path: PathBuf, column: String },
}

/// The three raw tables, as read from disk.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub referendum: DataFrame,
    pub regions: DataFrame,
    pub departments: DataFrame,
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load all three tables from the configured locations.
    pub fn load_all(input: &InputConfig) -> Result<RawTables, LoaderError> {
        let referendum = Self::load_referendum(&input.referendum)?;
        let regions = Self::load_regions(&input.regions)?;
        let departments = Self::load_departments(&input.departments)?;

        info!(
            "Loaded {} ballot rows, {} regions, {} departments",
            referendum.height(),
            regions.height(),
            departments.height()
        );

        Ok(RawTables {
            referendum,
            regions,
            departments,
        })
    }

    /// Semicolon-delimited. Headers are not trusted; columns are renamed later by position.
    pub fn load_referendum(path: &Path) -> Result<DataFrame, LoaderError> {
        Self::read_csv(path, b';')
    }

    pub fn load_regions(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = Self::read_csv(path, b',')?;
        Self::require_columns(&df, path, &["code", "name"])?;
        Ok(df)
    }

    pub fn load_departments(path: &Path) -> Result<DataFrame, LoaderError> {
        let df = Self::read_csv(path, b',')?;
        Self::require_columns(&df, path, &["region_code", "code", "name"])?;
        Ok(df)
    }

    /// Every column comes back as String so codes like "01" or "2A" survive untouched.
    fn read_csv(path: &Path, separator: u8) -> Result<DataFrame, LoaderError> {
        if !path.is_file() {
            return Err(LoaderError::MissingFile(path.to_path_buf()));
        }

        let df = LazyCsvReader::new(path)
            .with_separator(separator)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        Ok(df)
    }

    fn require_columns(df: &DataFrame, path: &Path, columns: &[&str]) -> Result<(), LoaderError> {
        for column in columns {
            if df.column(column).is_err() {
                return Err(LoaderError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn referendum_codes_stay_text() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "referendum.csv",
            "Department code;Department name;Town code;Town name;Registered;Abstentions;Null;Choice A;Choice B\n\
             01;AIN;1;L'Abergement;592;113;21;218;240\n\
             2A;CORSE-DU-SUD;4;Ajaccio;39000;9000;800;15000;14200\n",
        );

        let df = DataLoader::load_referendum(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 9);

        let codes: Vec<Option<&str>> = df
            .column("Department code")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(codes, vec![Some("01"), Some("2A")]);
    }

    #[test]
    fn missing_file_is_reported_with_its_path() {
        let err = DataLoader::load_regions(Path::new("does/not/exist.csv")).unwrap_err();
        match err {
            LoaderError::MissingFile(path) => assert_eq!(path, PathBuf::from("does/not/exist.csv")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn departments_without_region_code_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "departments.csv", "id,code,name\n1,01,Ain\n");

        let err = DataLoader::load_departments(&path).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn { ref column, .. } if column == "region_code"));
    }
}

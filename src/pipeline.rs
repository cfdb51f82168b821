//! The whole run: load, join, aggregate, join to boundaries, render.

use crate::charts::{ChoroplethRenderer, MapStyle, MapTable};
use crate::config::{AppConfig, OutputConfig};
use crate::data::{load_boundaries, DataLoader, DataProcessor};
use crate::stats::{RegionResult, ResultAggregator};
use anyhow::{Context, Result};
use log::{debug, warn};

impl From<&OutputConfig> for MapStyle {
    fn from(output: &OutputConfig) -> Self {
        Self {
            width: output.width,
            height: output.height,
            title: output.title.clone(),
            legend: output.legend,
        }
    }
}

/// Run every step and return the final per-region table with its ratio.
pub fn run(config: &AppConfig) -> Result<MapTable> {
    let raw = DataLoader::load_all(&config.input).context("Failed to load input tables")?;

    let area = DataProcessor::merge_regions_and_departments(&raw.regions, &raw.departments)
        .context("Failed to merge regions and departments")?;

    let ballots = DataProcessor::merge_referendum_and_areas(&raw.referendum, &area)
        .context("Failed to merge referendum and areas")?;

    let by_region = ResultAggregator::by_region(&ballots)
        .context("Failed to aggregate results by region")?;
    debug!("Results by region:\n{}", by_region);
    let results = RegionResult::from_frame(&by_region)?;

    let boundaries = load_boundaries(
        &config.input.boundaries,
        &config.input.boundary_code_property,
    )
    .context("Failed to load region boundaries")?;

    let table = MapTable::join(results, boundaries)
        .context("Failed to join results to region boundaries")?;

    if let Some(path) = &config.output.table {
        table.write_csv(path)?;
    }

    ChoroplethRenderer::render_to_file(&table, &MapStyle::from(&config.output), &config.output.map)
        .with_context(|| format!("Failed to render map to {:?}", config.output.map))?;

    if config.output.open {
        if let Err(e) = open::that(&config.output.map) {
            warn!("Could not open {:?}: {}", config.output.map, e);
        }
    }

    Ok(table)
}

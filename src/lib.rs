//! Referendum Map - Referendum results by region & choropleth rendering
//!
//! Loads the referendum, region and department tables, joins them, sums the
//! votes per region and shades each region by its Choice A share.

pub mod charts;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod stats;

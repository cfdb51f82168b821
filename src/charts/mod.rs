//! Charts module - Map rows and choropleth rendering

mod map_data;
mod renderer;

pub use map_data::{choice_a_ratio, MapError, MapRow, MapTable};
pub use renderer::{ChoroplethRenderer, MapStyle, RenderError};

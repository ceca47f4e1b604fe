//! Slippy basemap: projection maths, animated viewport, tile cache and the
//! draggable-marker widget.

pub mod projection;
pub mod tiles;
pub mod viewport;
pub mod widget;

pub use tiles::{TileCache, TileId};
pub use viewport::MapViewport;
pub use widget::{show_map, MapEvent, MapInteraction, MarkerStyle, MarkerView};

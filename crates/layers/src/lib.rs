pub mod canvas;
pub mod compositor;
pub mod instances;
pub mod layer;
pub mod symbology;

pub use compositor::*;
pub use layer::*;
pub use symbology::{Palette, Rgba, category_hash, map_points};

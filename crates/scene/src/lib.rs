pub mod interaction;
pub mod picking;
pub mod points;
pub mod selection;
pub mod settings;
pub mod viewport;

pub use interaction::*;
pub use points::*;
pub use selection::*;
pub use settings::*;
pub use viewport::*;

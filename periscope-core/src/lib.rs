pub mod input;
pub mod model;
pub mod utils;

pub use model::*;

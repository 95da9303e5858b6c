#![forbid(unsafe_code)]

pub mod ids;
pub mod model;
pub mod progression;

pub use ids::*;
pub use model::*;

#![forbid(unsafe_code)]

mod aggregate;
mod definition;
mod derive;
mod transition;

pub use aggregate::*;
pub use definition::*;
pub use derive::*;
pub use transition::*;

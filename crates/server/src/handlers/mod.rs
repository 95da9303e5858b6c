#![forbid(unsafe_code)]

mod content;
mod definitions;
mod dispatch;
mod progression;
mod wire;
mod wrappers;

pub(crate) use definitions::handler_definitions;
pub(crate) use dispatch::{METHOD_NAMES, dispatch_handler};

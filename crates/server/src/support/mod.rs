#![forbid(unsafe_code)]

mod ai;
mod args;
mod jsonrpc;
mod runtime;
mod session_log;
mod time;

pub(crate) use ai::*;
pub(crate) use args::*;
pub(crate) use jsonrpc::*;
pub(crate) use runtime::*;
pub(crate) use session_log::*;
pub(crate) use time::*;

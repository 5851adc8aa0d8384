mod backend;
mod client;
mod column_def;
mod config;
mod error;
mod escape;
mod frame;
mod insert;
mod inspector;
mod result;
mod types;
mod util;
mod value;

pub use ::anyhow::Context;
pub use backend::*;
pub use client::*;
pub use column_def::*;
pub use config::*;
pub use error::*;
pub use escape::{Parameters, ServerTimezone, escape_value, substitute_parameters};
pub use frame::*;
pub use insert::*;
pub use inspector::*;
pub use result::*;
pub use types::*;
pub use util::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;

//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::{Command, TesterArgs};
pub use types::{HttpMethod, PositiveUsize};

pub(crate) use defaults::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub(crate) use parsers::parse_header;

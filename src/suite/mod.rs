//! The built-in suite: case catalogue, fixtures, the connectivity probe and
//! the group runner.
mod catalogue;
mod fixtures;
mod probe;
mod runner;


pub use catalogue::{CHAT_MODEL, CatalogueOptions, EMBEDDING_MODEL, SuiteGroup, build_catalogue};
pub use fixtures::{DOCX_FIXTURE, Fixture, FixtureSource, Fixtures, PDF_FIXTURE, load_fixtures};
pub use probe::{
    DEFAULT_PROBE_ENDPOINTS, ProbeReport, ProbeResult, probe_endpoints, probe_server,
};
pub use runner::run_groups;

//! Core library for the `endpoint-probe` CLI.
//!
//! Every outbound test request runs inside a [`telemetry::Tracker`] that
//! produces exactly one record: a console verdict line and a sanitized
//! JSON-lines entry, folded into the run summary the report prints at the end.
//! The suite catalogue, the connectivity probe, configuration and workflow
//! loading are built on that core.
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod report;
pub mod suite;
pub mod system;
pub mod telemetry;
pub mod workflow;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;

#[cfg(test)]
mod test_support;

//! Outbound calls to the target server, each wrapped in a telemetry tracker.
mod client;
mod harness;
mod transport;


pub use client::{ClientSettings, ReqwestTransport, build_default_headers};
pub use harness::{
    Expectation, Harness, TrackedRequest, TrackedResponse, classify, join_endpoint,
};
pub use transport::{OutboundRequest, RawResponse, Transport, TransportError};

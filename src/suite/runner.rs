use futures_util::StreamExt;
use futures_util::future::join_all;
use futures_util::stream;
use tracing::info;

use crate::http::{Harness, TrackedRequest, TrackedResponse};

use super::catalogue::SuiteGroup;

/// Runs every group in order under its suite banner.
///
/// Sequential groups keep at most `concurrency` requests in flight and
/// finish in catalogue order; parallel groups fire every case at once.
pub async fn run_groups(
    harness: &Harness,
    groups: Vec<SuiteGroup>,
    concurrency: usize,
) -> Vec<TrackedResponse> {
    let mut responses = Vec::new();
    for group in groups {
        let sink = harness.sink();
        sink.begin_suite(group.name, Some(group.description));
        let count = group.cases.len();
        let batch = run_group(harness, group.cases, group.parallel, concurrency).await;
        let passed = batch.iter().filter(|response| response.is_success()).count();
        info!(suite = group.name, passed, total = count, "Suite finished");
        sink.end_suite(group.name);
        responses.extend(batch);
    }
    responses
}

async fn run_group(
    harness: &Harness,
    cases: Vec<TrackedRequest>,
    parallel: bool,
    concurrency: usize,
) -> Vec<TrackedResponse> {
    if parallel {
        return join_all(
            cases
                .into_iter()
                .map(|case| harness.make_tracked_request(case)),
        )
        .await;
    }
    stream::iter(cases)
        .map(|case| harness.make_tracked_request(case))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

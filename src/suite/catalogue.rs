use serde_json::{Value, json};

use crate::http::{Expectation, TrackedRequest};
use crate::report::category;
use crate::workflow::{WORKFLOW_ENDPOINT, WorkflowDocument};

use super::fixtures::Fixtures;

pub const CHAT_MODEL: &str = "qwen3-0.6b";
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
const SEARCH_QUERY: &str = "What are the main benefits of retrieval augmented generation?";

/// Cases that run under one banner.
#[derive(Debug, Clone)]
pub struct SuiteGroup {
    pub name: &'static str,
    pub description: &'static str,
    /// Fire every case at once instead of through the shared concurrency limit.
    pub parallel: bool,
    pub cases: Vec<TrackedRequest>,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogueOptions<'a> {
    pub fixtures: &'a Fixtures,
    pub workflows: &'a [WorkflowDocument],
    pub concurrent_requests: usize,
}

#[must_use]
pub fn build_catalogue(options: CatalogueOptions<'_>) -> Vec<SuiteGroup> {
    let mut groups = vec![
        server_health(),
        engine_tests(),
        document_processing(options.fixtures),
        retrieval(),
        agent_system(),
    ];
    if !options.workflows.is_empty() {
        groups.push(workflows(options.workflows));
    }
    if options.concurrent_requests > 0 {
        groups.push(concurrent_embeddings(options.concurrent_requests));
    }
    groups
}

fn server_health() -> SuiteGroup {
    SuiteGroup {
        name: category::SERVER_HEALTH,
        description: "Liveness and metrics endpoints",
        parallel: false,
        cases: vec![
            TrackedRequest::get("Health Check", "/health").category(category::SERVER_HEALTH),
            TrackedRequest::get("Server Metrics", "/metrics").category(category::SERVER_HEALTH),
        ],
    }
}

pub(crate) fn chat_completion_body() -> Value {
    json!({
        "model": CHAT_MODEL,
        "messages": [
            {"role": "system", "content": "You are a helpful assistant."},
            {"role": "user", "content": "What is the capital of France?"}
        ],
        "max_tokens": 50,
        "temperature": 0.7,
        "stream": false
    })
}

pub(crate) fn embedding_body(input: &str) -> Value {
    json!({
        "model": EMBEDDING_MODEL,
        "input": input,
        "encoding_format": "float"
    })
}

fn engine_tests() -> SuiteGroup {
    SuiteGroup {
        name: category::ENGINE,
        description: "Chat completion and embedding generation",
        parallel: false,
        cases: vec![
            TrackedRequest::post(
                "Chat Completion",
                "/v1/chat/completions",
                chat_completion_body(),
            )
            .category(category::ENGINE)
            .metadata("model", json!(CHAT_MODEL))
            .expect(Expectation::NonEmptyArray("choices")),
            TrackedRequest::post(
                "Embedding Generation",
                "/v1/embeddings",
                embedding_body("The quick brown fox jumps over the lazy dog."),
            )
            .category(category::ENGINE)
            .metadata("model", json!(EMBEDDING_MODEL))
            .expect(Expectation::NonEmptyArray("data")),
        ],
    }
}

fn document_processing(fixtures: &Fixtures) -> SuiteGroup {
    let mut cases = vec![
        TrackedRequest::post(
            "PDF Parsing",
            "/parse-pdf",
            json!({
                "data": fixtures.pdf.encoded,
                "method": "fast",
                "language": "eng"
            }),
        )
        .category(category::DOCUMENTS)
        .metadata("file_path", json!(fixtures.pdf.label()))
        .metadata("file_size_bytes", json!(fixtures.pdf.size_bytes))
        .expect(Expectation::JsonObject),
    ];
    if let Some(docx) = fixtures.docx.as_ref() {
        cases.push(
            TrackedRequest::post("DOCX Parsing", "/parse-docx", json!({"data": docx.encoded}))
                .category(category::DOCUMENTS)
                .metadata("file_path", json!(docx.label()))
                .metadata("file_size_bytes", json!(docx.size_bytes))
                .expect(Expectation::JsonObject),
        );
    }
    cases.push(
        TrackedRequest::post(
            "Document Upload",
            "/documents",
            json!({
                "documents": [
                    {
                        "text": "Retrieval augmented generation grounds model answers in indexed documents.",
                        "metadata": {"source": "endpoint-probe", "topic": "rag"}
                    },
                    {
                        "text": "Vector search ranks documents by embedding similarity.",
                        "metadata": {"source": "endpoint-probe", "topic": "search"}
                    }
                ]
            }),
        )
        .category(category::DOCUMENTS)
        .expect(Expectation::JsonObject),
    );
    SuiteGroup {
        name: category::DOCUMENTS,
        description: "PDF/DOCX parsing and document ingestion",
        parallel: false,
        cases,
    }
}

fn retrieval() -> SuiteGroup {
    SuiteGroup {
        name: category::RETRIEVAL,
        description: "Keyword and vector search over ingested documents",
        parallel: false,
        cases: vec![
            TrackedRequest::post(
                "Document Search",
                "/search",
                json!({"query": SEARCH_QUERY, "limit": 5, "score_threshold": 0.5}),
            )
            .category(category::RETRIEVAL)
            .expect(Expectation::JsonObject),
            TrackedRequest::post(
                "Vector Search",
                "/vector-search",
                json!({"query": SEARCH_QUERY, "limit": 5, "collection": "default"}),
            )
            .category(category::RETRIEVAL)
            .expect(Expectation::JsonObject),
        ],
    }
}

fn agent_system() -> SuiteGroup {
    SuiteGroup {
        name: category::AGENTS,
        description: "Agent registry endpoints",
        parallel: false,
        cases: vec![
            TrackedRequest::get("List Agents", "/agents").category(category::AGENTS),
            TrackedRequest::get("Agent System Health", "/agents/health")
                .category(category::AGENTS),
        ],
    }
}

fn workflows(documents: &[WorkflowDocument]) -> SuiteGroup {
    SuiteGroup {
        name: category::WORKFLOWS,
        description: "Workflow definitions submitted as static documents",
        parallel: false,
        cases: documents
            .iter()
            .map(|document| {
                TrackedRequest::post(
                    document.test_name(),
                    WORKFLOW_ENDPOINT,
                    document.definition.clone(),
                )
                .category(category::WORKFLOWS)
                .metadata("workflow_id", json!(document.workflow_id))
                .metadata("source", json!(document.path.display().to_string()))
            })
            .collect(),
    }
}

fn concurrent_embeddings(requests: usize) -> SuiteGroup {
    SuiteGroup {
        name: category::CONCURRENCY,
        description: "Simultaneous embedding requests",
        parallel: true,
        cases: (1..=requests)
            .map(|index| {
                TrackedRequest::post(
                    format!("Concurrent Embedding {}", index),
                    "/v1/embeddings",
                    embedding_body(&format!("Concurrent request number {}", index)),
                )
                .category(category::CONCURRENCY)
                .metadata("request_index", json!(index))
                .metadata("concurrent_requests", json!(requests))
                .expect(Expectation::NonEmptyArray("data"))
            })
            .collect(),
    }
}

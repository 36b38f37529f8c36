use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use tracing::{info, warn};

use crate::error::{AppError, AppResult, HttpError};

pub const PDF_FIXTURE: &str = "test_pdf.pdf";
pub const DOCX_FIXTURE: &str = "test_docx.docx";

/// One-page PDF used when no PDF fixture is on disk.
const EMBEDDED_PDF: &[u8] = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 200 100] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj
4 0 obj << /Length 44 >> stream
BT /F1 12 Tf 20 50 Td (endpoint-probe) Tj ET
endstream endobj
5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj
trailer << /Root 1 0 R >>
%%EOF
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSource {
    File(PathBuf),
    Embedded,
}

/// Base64 payload for a document parsing case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub source: FixtureSource,
    pub encoded: String,
    /// Size of the decoded file.
    pub size_bytes: u64,
}

impl Fixture {
    fn from_bytes(source: FixtureSource, bytes: &[u8]) -> Self {
        Self {
            source,
            encoded: B64.encode(bytes),
            size_bytes: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match &self.source {
            FixtureSource::File(path) => path.display().to_string(),
            FixtureSource::Embedded => "embedded sample".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixtures {
    pub pdf: Fixture,
    /// `None` when no DOCX is on disk; the DOCX case is then left out.
    pub docx: Option<Fixture>,
}

/// Reads the parse fixtures from `dir`.
///
/// # Errors
///
/// Returns an error when a fixture exists but cannot be read.
pub fn load_fixtures(dir: &Path) -> AppResult<Fixtures> {
    let pdf_path = dir.join(PDF_FIXTURE);
    let pdf = match read_optional(&pdf_path)? {
        Some(bytes) => Fixture::from_bytes(FixtureSource::File(pdf_path), &bytes),
        None => {
            info!(
                "No PDF fixture at {}, using the embedded sample",
                pdf_path.display()
            );
            Fixture::from_bytes(FixtureSource::Embedded, EMBEDDED_PDF)
        }
    };

    let docx_path = dir.join(DOCX_FIXTURE);
    let docx = read_optional(&docx_path)?
        .map(|bytes| Fixture::from_bytes(FixtureSource::File(docx_path.clone()), &bytes));
    if docx.is_none() {
        warn!(
            "No DOCX fixture at {}, skipping DOCX parsing",
            docx_path.display()
        );
    }

    Ok(Fixtures { pdf, docx })
}

fn read_optional(path: &Path) -> AppResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(AppError::http(HttpError::ReadFixture {
            path: path.to_path_buf(),
            source: err,
        })),
    }
}

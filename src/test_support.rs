use std::future::Future;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::telemetry::{LogEntry, TelemetrySink};

/// Cloneable in-memory writer; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that rejects every write.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}

pub(crate) struct MemorySink {
    pub(crate) sink: Arc<TelemetrySink>,
    pub(crate) console: SharedBuffer,
    pub(crate) file: SharedBuffer,
}

impl MemorySink {
    pub(crate) fn entries(&self) -> Result<Vec<LogEntry>, String> {
        self.file
            .lines()
            .iter()
            .map(|line| {
                serde_json::from_str::<LogEntry>(line)
                    .map_err(|err| format!("Unparseable log line {}: {}", line, err))
            })
            .collect()
    }

    pub(crate) fn single_entry(&self) -> Result<LogEntry, String> {
        let mut entries = self.entries()?;
        if entries.len() != 1 {
            return Err(format!("Expected 1 log line, got {}", entries.len()));
        }
        entries
            .pop()
            .ok_or_else(|| "Expected a log line".to_owned())
    }
}

pub(crate) fn memory_sink(details: bool) -> Result<MemorySink, String> {
    let console = SharedBuffer::default();
    let file = SharedBuffer::default();
    let sink = TelemetrySink::with_writers(
        Box::new(console.clone()),
        Some(Box::new(file.clone())),
        details,
    )
    .map_err(|err| format!("Failed to build sink: {}", err))?;
    Ok(MemorySink {
        sink: Arc::new(sink),
        console,
        file,
    })
}

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

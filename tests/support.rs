use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread;
use std::time::Duration;

/// Canned answer for one request path.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub path: &'static str,
    pub status: u16,
    pub body: &'static str,
}

pub const fn route(path: &'static str, status: u16, body: &'static str) -> Route {
    Route { path, status, body }
}

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ServerHandle {
    /// Request heads received so far, e.g. `POST /v1/embeddings`.
    pub fn seen(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a JSON HTTP server answering `routes`; other paths get 404.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server(routes: Vec<Route>) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let routes = Arc::new(routes);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_server = Arc::clone(&seen);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let routes = Arc::clone(&routes);
                    let seen = Arc::clone(&seen_by_server);
                    thread::spawn(move || handle_client(stream, &routes, &seen));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok((
        format!("http://{}", addr),
        ServerHandle {
            shutdown: shutdown_tx,
            thread: Some(handle),
            seen,
        },
    ))
}

pub fn spawn_http_server_or_skip(
    routes: Vec<Route>,
) -> Result<Option<(String, ServerHandle)>, String> {
    match spawn_http_server(routes) {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.contains("Operation not permitted") => {
            eprintln!("Skipping e2e test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// A local URL nothing listens on.
///
/// # Errors
///
/// Returns an error if no port can be reserved.
pub fn unused_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind probe port failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        data.extend_from_slice(chunk.get(..read)?);
        let text = String::from_utf8_lossy(&data).into_owned();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let head = text.get(..head_end)?.to_owned();
            let body_len = content_length(&head);
            let received = data.len().saturating_sub(head_end.saturating_add(4));
            if received >= body_len {
                return Some(head);
            }
        }
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

fn handle_client(mut stream: TcpStream, routes: &[Route], seen: &Mutex<Vec<String>>) {
    if stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .is_err()
    {
        return;
    }
    let Some(head) = read_request(&mut stream) else {
        return;
    };
    let request_line = head.lines().next().unwrap_or_default().to_owned();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_owned();
    let path = parts.next().unwrap_or_default().to_owned();
    seen.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(format!("{} {}", method, path));

    let (status, body) = routes
        .iter()
        .find(|route| route.path == path)
        .map_or((404, r#"{"detail":"Not Found"}"#), |route| {
            (route.status, route.body)
        });
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason_phrase(status),
        body.len(),
        body
    );
    if stream.write_all(response.as_bytes()).is_err() {
        return;
    }
    if stream.flush().is_err() {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}

/// Run the `endpoint-probe` binary from `dir` and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_probe_bin<I, S>(dir: &Path, args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = probe_bin()?;
    Command::new(bin)
        .args(args)
        .current_dir(dir)
        .env("RUST_LOG", "error")
        .env_remove("PROBE_LOG")
        .env_remove("PROBE_API_KEY")
        .env_remove("PROBE_BASE_URL")
        .output()
        .map_err(|err| format!("run endpoint-probe failed: {}", err))
}

fn probe_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_endpoint-probe").map_or_else(
        || Err("CARGO_BIN_EXE_endpoint-probe missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

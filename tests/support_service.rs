use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Child, Command, Output, Stdio};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// One request seen by the mock Perfana service.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the body is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, String> {
        serde_json::from_str(&self.body)
            .map_err(|err| format!("invalid JSON body on {}: {}", self.path, err))
    }
}

/// Canned responses per endpoint.
#[derive(Debug, Clone, Copy)]
pub struct MockResponses {
    pub init_status: u16,
    pub init_body: &'static str,
}

impl Default for MockResponses {
    fn default() -> Self {
        Self {
            init_status: 200,
            init_body: r#"{"testRunId":"e2e-run"}"#,
        }
    }
}

pub struct ServerHandle {
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ServerHandle {
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|request| request.path)
            .collect()
    }

    /// Blocks until `count` requests were recorded.
    ///
    /// # Errors
    ///
    /// Returns an error when the deadline passes first.
    pub fn wait_for_requests(&self, count: usize, timeout: Duration) -> Result<(), String> {
        let started = Instant::now();
        while self.requests().len() < count {
            if started.elapsed() > timeout {
                return Err(format!(
                    "Timed out waiting for {} requests, saw {:?}",
                    count,
                    self.paths()
                ));
            }
            thread::sleep(ACCEPT_POLL_INTERVAL);
        }
        Ok(())
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

/// Spawn a recording Perfana mock, or `None` when sockets are not permitted.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_perfana_mock_or_skip(
    responses: MockResponses,
) -> Result<Option<(String, ServerHandle)>, String> {
    match spawn_perfana_mock(responses) {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.contains("Operation not permitted") => {
            eprintln!("Skipping e2e test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn spawn_perfana_mock(responses: MockResponses) -> Result<(String, ServerHandle), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&requests);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    let recorder = Arc::clone(&recorder);
                    thread::spawn(move || handle_client(stream, responses, &recorder));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
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
            requests,
        },
    ))
}

fn handle_client(
    mut stream: TcpStream,
    responses: MockResponses,
    recorder: &Mutex<Vec<RecordedRequest>>,
) {
    if stream.set_nonblocking(false).is_err()
        || stream.set_read_timeout(Some(CLIENT_READ_TIMEOUT)).is_err()
    {
        return;
    }
    let Some(request) = read_request(&mut stream) else {
        return;
    };

    let (status, body) = match request.path.as_str() {
        "/api/init" => (responses.init_status, responses.init_body),
        _ => (200, ""),
    };
    if let Ok(mut guard) = recorder.lock() {
        guard.push(request);
    }

    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
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

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(chunk.get(..read)?);
        if let Some(pos) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(buffer.get(..header_end)?).into_owned();
    let mut lines = head.split("\r\n");
    let path = lines.next()?.split_whitespace().nth(1)?.to_owned();
    let mut content_length = 0usize;
    let mut authorization = None;
    for (key, value) in lines.filter_map(|line| line.split_once(':')) {
        let key = key.trim().to_ascii_lowercase();
        if key == "content-length" {
            content_length = value.trim().parse().ok()?;
        } else if key == "authorization" {
            authorization = Some(value.trim().to_owned());
        }
    }

    let body_start = header_end.saturating_add(4);
    let body_end = body_start.saturating_add(content_length);
    while buffer.len() < body_end {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(chunk.get(..read)?);
    }
    let body = String::from_utf8_lossy(buffer.get(body_start..body_end)?).into_owned();

    Some(RecordedRequest {
        path,
        authorization,
        body,
    })
}

/// Profile YAML pointing at `base_url`.
#[must_use]
pub fn profile_yaml(base_url: &str) -> String {
    format!(
        "apiKey: e2e-key\nbaseUrl: {}\nclientIdentifier: e2e\nsystemUnderTest: shop\nenvironment: acc\nworkload: load\nmtls:\n  enabled: false\n  clientCert: ''\n  clientKey: ''\n",
        base_url
    )
}

fn perfana_command<I, S>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = perfana_bin()?;
    let mut command = Command::new(bin);
    command
        .args(args)
        .env("PERFANA_LOG", "error")
        .env_remove("PERFANA_CLI_CONFIG");
    Ok(command)
}

/// Run the `perfana-cli` binary and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_perfana<I, S>(args: I) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    perfana_command(args)?
        .output()
        .map_err(|err| format!("run perfana-cli failed: {}", err))
}

/// Run the `perfana-cli` binary with extra environment variables.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_perfana_with_env<I, S>(args: I, envs: &[(&str, &str)]) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = perfana_command(args)?;
    for (key, value) in envs {
        command.env(key, value);
    }
    command
        .output()
        .map_err(|err| format!("run perfana-cli failed: {}", err))
}

/// Spawn the `perfana-cli` binary with piped output.
///
/// # Errors
///
/// Returns an error if the binary cannot be started.
pub fn spawn_perfana<I, S>(args: I) -> Result<Child, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    perfana_command(args)?
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| format!("spawn perfana-cli failed: {}", err))
}

fn perfana_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_perfana-cli").map_or_else(
        || Err("CARGO_BIN_EXE_perfana-cli missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

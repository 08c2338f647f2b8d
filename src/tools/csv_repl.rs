//! Python code execution against an uploaded CSV.
//!
//! The CSV is loaded into a pandas DataFrame inside a long-lived `python3`
//! subprocess. Each call sends one code block to that interpreter, which
//! `exec`s it in a namespace shared by every call, so names defined in one
//! step stay visible in the next. Exceptions raised by the code come back as
//! the observation text rather than as errors.
//!
//! SECURITY: the code runs with the full privileges of this process. There is
//! no sandbox beyond the subprocess boundary.

use super::{parse_query, query_schema, Tool, CSV_REPL};
use crate::config::CsvSettings;
use crate::error::{HjelperError, Result};
use crate::loader::{persist_upload, CsvTable, UploadedFile};
use async_trait::async_trait;
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Loads the CSV once, then serves length-prefixed code blocks from stdin.
///
/// Each reply is the captured stdout, or `repr(e)` if the block raised,
/// framed the same way. Stderr is discarded while code runs.
const RUNNER: &str = r#"
import contextlib, io, sys
import pandas as pd
namespace = {sys.argv[2]: pd.read_csv(sys.argv[1])}
requests, replies = sys.stdin.buffer, sys.stdout.buffer
while True:
    header = requests.readline()
    if not header:
        break
    code = requests.read(int(header)).decode("utf-8")
    buffer = io.StringIO()
    try:
        with contextlib.redirect_stdout(buffer), contextlib.redirect_stderr(io.StringIO()):
            exec(code, namespace)
        output = buffer.getvalue()
    except Exception as e:
        output = repr(e)
    data = output.encode("utf-8")
    replies.write(b"%d\n" % len(data))
    replies.write(data)
    replies.flush()
"#;

static LEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s|`)*(?i:python)?\s*").expect("Invalid regex"));
static TRAILING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\s|`)*$").expect("Invalid regex"));

/// A running interpreter with the DataFrame loaded.
struct Interpreter {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Interpreter {
    fn spawn(python: &str, csv: &Path, variable: &str, envs: &[(String, String)]) -> Result<Self> {
        let mut child = Command::new(python)
            .arg("-c")
            .arg(RUNNER)
            .arg(csv)
            .arg(variable)
            .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    HjelperError::ToolNotFound(python.to_string())
                } else {
                    HjelperError::Tool(format!("failed to start {}: {}", python, e))
                }
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HjelperError::Tool(format!("{} has no stdin", python)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HjelperError::Tool(format!("{} has no stdout", python)))?;

        debug!("Started {} (pid {:?})", python, child.id());
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Send one code block and wait for its reply.
    async fn run(&mut self, python: &str, code: &str) -> Result<String> {
        match self.exchange(code).await {
            Ok(output) => Ok(output),
            Err(e) => Err(self.failure(python, e).await),
        }
    }

    async fn exchange(&mut self, code: &str) -> std::io::Result<String> {
        let payload = code.as_bytes();
        self.stdin
            .write_all(format!("{}\n", payload.len()).as_bytes())
            .await?;
        self.stdin.write_all(payload).await?;
        self.stdin.flush().await?;

        let mut header = String::new();
        if self.stdout.read_line(&mut header).await? == 0 {
            return Err(std::io::ErrorKind::UnexpectedEof.into());
        }
        let len: usize = header.trim().parse().map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("malformed reply header {:?}", header.trim()),
            )
        })?;

        let mut body = vec![0; len];
        self.stdout.read_exact(&mut body).await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    /// Describe why the interpreter stopped answering.
    async fn failure(&mut self, python: &str, err: std::io::Error) -> HjelperError {
        match tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(Ok(status)) => {
                let mut stderr = String::new();
                if let Some(mut pipe) = self.child.stderr.take() {
                    let _ = pipe.read_to_string(&mut stderr).await;
                }
                HjelperError::Tool(format!("{} exited with {}: {}", python, status, stderr.trim()))
            }
            _ => HjelperError::Tool(format!("{} stopped responding: {}", python, err)),
        }
    }
}

/// Executes model-written Python against the uploaded table.
pub struct CsvReplTool {
    table: CsvTable,
    file: NamedTempFile,
    python: String,
    variable: String,
    timeout: Duration,
    description: String,
    fingerprint: String,
    envs: Vec<(String, String)>,
    interpreter: Mutex<Option<Interpreter>>,
}

impl CsvReplTool {
    /// Parse the upload and keep a copy on disk for the interpreter.
    ///
    /// A CSV that is not UTF-8 or has no header fails here, before any code
    /// runs. The interpreter itself starts on the first call.
    #[instrument(skip_all, fields(name = %upload.name))]
    pub fn new(
        upload: &UploadedFile,
        settings: &CsvSettings,
        description: &str,
        temp_dir: &Path,
    ) -> Result<Self> {
        let table = CsvTable::parse(&upload.bytes)?;
        let file = persist_upload(upload, temp_dir, ".csv")?;

        info!("Loaded CSV as `{}`: {}", settings.variable_name, table.describe());
        warn!("csv_repl executes model-generated Python without isolation");

        Ok(Self {
            table,
            file,
            python: settings.python.clone(),
            variable: settings.variable_name.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            description: description.to_string(),
            fingerprint: upload.fingerprint(),
            envs: Vec::new(),
            interpreter: Mutex::new(None),
        })
    }

    /// Set an environment variable for the interpreter.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// The parsed table.
    pub fn table(&self) -> &CsvTable {
        &self.table
    }

    /// Variable name the DataFrame is bound to.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Content hash of the upload.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Run code and return its stdout, or the exception it raised.
    ///
    /// Calls are serialized on one interpreter. A timeout kills it; the next
    /// call starts a fresh one with only the DataFrame defined. Interpreter
    /// failures (missing `python3`, pandas not importable, unreadable CSV,
    /// the code exiting the process) are returned as `Err`.
    pub async fn execute(&self, code: &str) -> Result<String> {
        let code = sanitize_code(code);
        debug!("Executing:\n{}", code);

        let mut slot = self.interpreter.lock().await;
        if slot.is_none() {
            *slot = Some(Interpreter::spawn(
                &self.python,
                self.file.path(),
                &self.variable,
                &self.envs,
            )?);
        }
        let Some(interpreter) = slot.as_mut() else {
            return Err(HjelperError::Tool(format!("{} is not running", self.python)));
        };

        let outcome = tokio::time::timeout(self.timeout, interpreter.run(&self.python, &code)).await;
        match outcome {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                *slot = None;
                Err(e)
            }
            Err(_) => {
                warn!("Execution exceeded {}s, restarting interpreter", self.timeout.as_secs());
                *slot = None;
                Ok(format!(
                    "TimeoutError('execution exceeded {} seconds')",
                    self.timeout.as_secs()
                ))
            }
        }
    }
}

/// Strip markdown fences, surrounding whitespace and a leading `python` tag.
pub fn sanitize_code(code: &str) -> String {
    let code = LEADING.replace(code, "");
    TRAILING.replace(&code, "").to_string()
}

#[async_trait]
impl Tool for CsvReplTool {
    fn name(&self) -> &str {
        CSV_REPL
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema("Python code to execute")
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let code = parse_query(arguments)?;
        self.execute(&code).await
    }
}

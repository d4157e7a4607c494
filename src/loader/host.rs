/*!
 * Host Environment
 * Process snapshot and injectable standard streams for units
 */

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Process facts captured once, when the loader is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    argv: Vec<String>,
    env: BTreeMap<String, String>,
    pid: u32,
    user: String,
    root: PathBuf,
}

impl HostEnvironment {
    /// Snapshot of the current process with no program arguments
    pub fn capture() -> Self {
        let env: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        let user = env
            .get("USER")
            .or_else(|| env.get("USERNAME"))
            .cloned()
            .unwrap_or_default();
        let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        Self {
            argv: Vec::new(),
            env,
            pid: std::process::id(),
            user,
            root,
        }
    }

    pub fn with_argv<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.argv = argv.into_iter().map(Into::into).collect();
        self
    }

    /// Directory of the application manifest
    pub fn with_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::capture()
    }
}

type Reader = Arc<Mutex<Box<dyn BufRead + Send>>>;
type Writer = Arc<Mutex<Box<dyn Write + Send>>>;

/// Standard streams handed to units through `Context`
#[derive(Clone)]
pub struct HostStreams {
    stdin: Reader,
    stdout: Writer,
    stderr: Writer,
}

impl HostStreams {
    pub fn new(
        stdin: Box<dyn BufRead + Send>,
        stdout: Box<dyn Write + Send>,
        stderr: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            stdin: Arc::new(Mutex::new(stdin)),
            stdout: Arc::new(Mutex::new(stdout)),
            stderr: Arc::new(Mutex::new(stderr)),
        }
    }

    /// The process's own stdin, stdout and stderr
    pub fn inherit() -> Self {
        Self::new(
            Box::new(BufReader::new(io::stdin())),
            Box::new(io::stdout()),
            Box::new(io::stderr()),
        )
    }

    /// In-memory streams; returns buffers collecting stdout and stderr
    pub fn capture(stdin: &str) -> (Self, SharedBuffer, SharedBuffer) {
        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let streams = Self::new(
            Box::new(Cursor::new(stdin.as_bytes().to_vec())),
            Box::new(stdout.clone()),
            Box::new(stderr.clone()),
        );
        (streams, stdout, stderr)
    }

    /// Next line without its terminator, `None` at end of input
    pub fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    pub fn write_stdout(&self, text: &str) -> io::Result<()> {
        let mut out = self.stdout.lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    pub fn write_stderr(&self, text: &str) -> io::Result<()> {
        let mut err = self.stderr.lock();
        err.write_all(text.as_bytes())?;
        err.flush()
    }
}

impl Default for HostStreams {
    fn default() -> Self {
        Self::inherit()
    }
}

impl std::fmt::Debug for HostStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostStreams").finish_non_exhaustive()
    }
}

/// Cloneable in-memory sink
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

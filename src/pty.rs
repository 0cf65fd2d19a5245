//! PTY process management for the embedded shell pane.

use std::future::Future;
use std::io::{ErrorKind, Read, Write};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

/// Bytes requested per read when no configuration overrides it.
pub const DEFAULT_READ_CHUNK: usize = 2048;

type SharedReader = Arc<Mutex<Box<dyn Read + Send>>>;

/// Owns one child shell attached to a pseudo-terminal.
///
/// Reads are handed out one at a time through [`PtyChannel::read_once`];
/// writes go straight to the master side. Implements `Drop` so the child is
/// killed and reaped on every exit path.
pub struct PtyChannel {
    master: Option<Box<dyn MasterPty + Send>>,
    writer: Box<dyn Write + Send>,
    reader: SharedReader,
    child: Option<Box<dyn Child + Send + Sync>>,
    read_chunk: usize,
}

/// Shell to run: `$SHELL`, falling back to `bash`.
pub fn default_shell() -> String {
    std::env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "bash".to_string())
}

impl PtyChannel {
    /// Spawn `shell` on a new PTY of the given size.
    pub fn spawn(shell: &str, rows: u16, cols: u16) -> Result<Self> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .context("Failed to open PTY")?;

        let mut cmd = CommandBuilder::new(shell);
        cmd.env("TERM", "xterm-256color");
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("Failed to spawn {}", shell))?;
        // Only the child keeps the slave open, so its exit shows up as EOF.
        drop(pair.slave);

        let writer = pair
            .master
            .take_writer()
            .context("Failed to get PTY writer")?;
        let reader = pair
            .master
            .try_clone_reader()
            .context("Failed to get PTY reader")?;

        tracing::info!(shell, pid = ?child.process_id(), "spawned shell on pty");

        Ok(Self {
            master: Some(pair.master),
            writer,
            reader: Arc::new(Mutex::new(reader)),
            child: Some(child),
            read_chunk: DEFAULT_READ_CHUNK,
        })
    }

    /// Build a channel over arbitrary byte streams with no child process.
    pub fn from_parts(writer: Box<dyn Write + Send>, reader: Box<dyn Read + Send>) -> Self {
        Self {
            master: None,
            writer,
            reader: Arc::new(Mutex::new(reader)),
            child: None,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }

    pub fn with_read_chunk(mut self, read_chunk: usize) -> Self {
        self.read_chunk = read_chunk.max(1);
        self
    }

    /// Write all of `data` to the PTY master, unbuffered.
    pub fn write_input(&mut self, data: &[u8]) -> Result<()> {
        self.writer
            .write_all(data)
            .context("Failed to write to PTY")?;
        self.writer.flush().context("Failed to flush PTY")?;
        Ok(())
    }

    /// A single read from the PTY. Resolves to the bytes read, or to an
    /// empty vector on EOF or error, which means "stop pumping".
    pub fn read_once(&self) -> impl Future<Output = Vec<u8>> + Send + 'static {
        let reader = Arc::clone(&self.reader);
        let chunk = self.read_chunk;
        async move {
            tokio::task::spawn_blocking(move || read_chunk(&reader, chunk))
                .await
                .unwrap_or_default()
        }
    }

    pub fn resize(&self, rows: u16, cols: u16) -> Result<()> {
        if let Some(master) = &self.master {
            master
                .resize(PtySize {
                    rows,
                    cols,
                    pixel_width: 0,
                    pixel_height: 0,
                })
                .context("Failed to resize PTY")?;
        }
        Ok(())
    }
}

fn read_chunk(reader: &SharedReader, chunk: usize) -> Vec<u8> {
    let Ok(mut reader) = reader.lock() else {
        return Vec::new();
    };
    let mut buf = vec![0u8; chunk];
    loop {
        match reader.read(&mut buf) {
            Ok(n) => {
                buf.truncate(n);
                return buf;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::debug!("pty read ended: {}", e);
                return Vec::new();
            }
        }
    }
}

impl Drop for PtyChannel {
    fn drop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };

        // ESRCH (no such process) is expected if already exited
        if let Err(e) = child.kill() {
            tracing::debug!("Kill child process: {}", e);
        }
        if let Err(e) = child.wait() {
            tracing::debug!("Wait for child process: {}", e);
        }
        self.master.take();

        tracing::debug!("PTY channel dropped, child process cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reads_arrive_in_order_then_sentinel() {
        let reader = Cursor::new(b"hello world".to_vec());
        let channel = PtyChannel::from_parts(Box::new(Sink::default()), Box::new(reader))
            .with_read_chunk(5);

        assert_eq!(channel.read_once().await, b"hello");
        assert_eq!(channel.read_once().await, b" worl");
        assert_eq!(channel.read_once().await, b"d");
        assert!(channel.read_once().await.is_empty());
    }

    #[test]
    fn test_write_input_reaches_writer() {
        let sink = Sink::default();
        let mut channel =
            PtyChannel::from_parts(Box::new(sink.clone()), Box::new(Cursor::new(Vec::new())));
        channel.write_input(b"ls").unwrap();
        channel.write_input(b"\r").unwrap();
        assert_eq!(&*sink.0.lock().unwrap(), b"ls\r");
    }

    #[test]
    fn test_default_shell_falls_back() {
        let shell = default_shell();
        assert!(!shell.is_empty());
    }
}

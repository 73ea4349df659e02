//! Hook output
//!
//! The deployment agent captures stdout of every lifecycle script, so outcome
//! lines are printed there with a fixed tag. Diagnostics go through `tracing`
//! on stderr instead.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Warn,
    Fatal,
    Ok,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Warn => "[WARN]",
            Tag::Fatal => "[FATAL]",
            Tag::Ok => "[OK]",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn format_line(tag: Tag, message: impl fmt::Display) -> String {
    format!("{tag} {message}")
}

type Sink = Box<dyn Write + Send>;

/// 钩子结果行的输出端，默认写到stdout
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<Mutex<Sink>>,
}

impl Reporter {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(format_line(Tag::Warn, message));
    }

    pub fn fatal(&self, message: impl fmt::Display) {
        self.emit(format_line(Tag::Fatal, message));
    }

    pub fn ok(&self, message: impl fmt::Display) {
        self.emit(format_line(Tag::Ok, message));
    }

    /// 不带标签的结果行，例如注册/注销结果
    pub fn plain(&self, message: impl fmt::Display) {
        self.emit(message.to_string());
    }

    fn emit(&self, line: String) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(sink, "{line}").and_then(|_| sink.flush()) {
            warn!("Failed to write hook output: {}", e);
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

/// 内存输出端，克隆后共享同一缓冲区
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

//! Shared helpers for unit tests

use crate::error::{AwsError, classify_aws_error};
use std::io;
use std::sync::{Arc, Mutex};
use tracing::Level;
use tracing::subscriber::DefaultGuard;

/// An error as the SDK adapters would classify it for the given code
pub(crate) fn aws_error(code: &str) -> AwsError {
    classify_aws_error(Some(code), Some("scripted failure"))
}

pub(crate) fn no_such_entity() -> AwsError {
    aws_error("NoSuchEntity")
}

pub(crate) fn access_denied() -> AwsError {
    aws_error("AccessDenied")
}

/// Log output captured by [`capture_logs`]
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// The first captured line containing `message`
    pub(crate) fn line(&self, message: &str) -> Option<String> {
        self.contents()
            .lines()
            .find(|line| line.contains(message))
            .map(str::to_string)
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's `info` and above events into a buffer until the guard drops
pub(crate) fn capture_logs() -> (DefaultGuard, LogBuffer) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .finish();
    (tracing::subscriber::set_default(subscriber), buffer)
}

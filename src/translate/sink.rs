//! Destinations for the full text of failed requests.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::error;

/// A write-only destination for error text.
///
/// Called once per failing request with the full error, causes included.
/// Implementations shared between concurrent requests handle their own
/// synchronisation. A returned error is swallowed by the translator.
pub trait ErrorSink: Send + Sync {
    fn write_error(&self, text: &str) -> io::Result<()>;
}

/// The process' standard error stream, one line per error. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stderr;

impl ErrorSink for Stderr {
    fn write_error(&self, text: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "{text}")
    }
}

/// Emits each error as a `tracing` event at `ERROR` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn write_error(&self, text: &str) -> io::Result<()> {
        error!(error = text, "request failed");
        Ok(())
    }
}

/// Any writer behind a mutex: files, buffers, sockets.
impl<W> ErrorSink for Mutex<W>
where
    W: Write + Send,
{
    fn write_error(&self, text: &str) -> io::Result<()> {
        let mut writer = self
            .lock()
            .map_err(|_| io::Error::other("error sink mutex poisoned"))?;
        writeln!(writer, "{text}")
    }
}

impl<S> ErrorSink for Arc<S>
where
    S: ErrorSink + ?Sized,
{
    fn write_error(&self, text: &str) -> io::Result<()> {
        (**self).write_error(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutex_sink_writes_one_line_per_error() {
        let sink = Mutex::new(Vec::<u8>::new());
        sink.write_error("first").unwrap();
        sink.write_error("second").unwrap();

        let written = sink.into_inner().unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn shared_sink_writes_through_the_arc() {
        let sink = Arc::new(Mutex::new(Vec::<u8>::new()));
        let handle: Arc<dyn ErrorSink> = sink.clone();
        handle.write_error("shared").unwrap();

        assert_eq!(sink.lock().unwrap().as_slice(), b"shared\n");
    }
}

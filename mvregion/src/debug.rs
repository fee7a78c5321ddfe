//! # Raw frame capture

use log::*;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Default capture file name.
pub const DEFAULT_CAPTURE: &str = "debug_motion.data";

type Opener = Box<dyn FnMut() -> io::Result<Box<dyn Write + Send>> + Send>;

/// Append-only sink for raw frame buffers.
///
/// The underlying writer is opened on first write. If opening fails, the sink stays disabled until
/// it is closed again.
pub struct DebugSink {
    open: Opener,
    writer: Option<Box<dyn Write + Send>>,
    failed: bool,
}

impl Default for DebugSink {
    fn default() -> Self {
        Self::to_file(DEFAULT_CAPTURE)
    }
}

impl DebugSink {
    /// Create a sink with a custom writer factory.
    pub fn new(open: impl FnMut() -> io::Result<Box<dyn Write + Send>> + Send + 'static) -> Self {
        Self {
            open: Box::new(open),
            writer: None,
            failed: false,
        }
    }

    /// Create a sink appending to a file.
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(move || {
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            info!("capturing motion data to {}", path.display());
            Ok(Box::new(BufWriter::new(file)) as _)
        })
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Append a buffer to the sink, opening it if needed.
    pub fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.failed {
            return Ok(());
        }

        if self.writer.is_none() {
            match (self.open)() {
                Ok(writer) => self.writer = Some(writer),
                Err(e) => {
                    self.failed = true;
                    return Err(e);
                }
            }
        }

        match &mut self.writer {
            Some(writer) => writer.write_all(buf),
            None => Ok(()),
        }
    }

    /// Flush and drop the writer.
    pub fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                error!("failed to flush motion capture: {e}");
            }
        }
        self.failed = false;
    }
}

impl Drop for DebugSink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn appends_and_reopens() {
        let buf = SharedBuf::default();
        let opens = Arc::new(Mutex::new(0));

        let mut sink = {
            let buf = buf.clone();
            let opens = opens.clone();
            DebugSink::new(move || {
                *opens.lock().unwrap() += 1;
                Ok(Box::new(buf.clone()) as _)
            })
        };

        assert!(!sink.is_open());
        sink.write(&[1, 2]).unwrap();
        sink.write(&[3]).unwrap();
        assert!(sink.is_open());
        sink.close();
        sink.write(&[4]).unwrap();

        assert_eq!(*buf.0.lock().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(*opens.lock().unwrap(), 2);
    }

    #[test]
    fn failure_latches_until_closed() {
        let mut sink = DebugSink::new(|| Err(io::Error::new(io::ErrorKind::Other, "no sink")));

        assert!(sink.write(&[1]).is_err());
        assert!(sink.write(&[1]).is_ok());
        sink.close();
        assert!(sink.write(&[1]).is_err());
    }
}

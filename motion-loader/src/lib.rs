//! Common `MotionSource` loader.
//!
//! Captures are plain concatenations of raw frames, each holding `rows * cols` motion blocks.
//! This is the format written by the analyser's debug capture.

use log::*;
use mvregion::prelude::v1::*;
use std::io::{self, BufReader, ErrorKind, Read};
use std::net::{TcpListener, TcpStream};

/// Create a motion source for the given input.
///
/// `tcp://host:port` connects to a remote stream, `tcp://@:port` waits for a connection on the
/// given port. Anything else is opened as a file.
pub fn create_source(input: &str, rows: usize, cols: usize) -> Result<Box<dyn MotionSource>> {
    if rows == 0 || cols == 0 {
        return Err(mvregion::Error::MalformedGrid { rows, cols }.into());
    }

    let reader = BufReader::new(open_stream(input)?);
    Ok(Box::new(RawDumpSource::new(reader, rows, cols)?))
}

/// Open a file or an input stream.
pub fn open_stream(input: &str) -> Result<Box<dyn Read + Send>> {
    if let Some(input) = input.strip_prefix("tcp://") {
        let (addr, port) = input
            .split_once(':')
            .ok_or_else(|| anyhow!("Invalid format"))?;
        let port: u16 = str::parse(port)?;

        let stream = if addr == "@" {
            let listener = TcpListener::bind(("0.0.0.0", port))?;
            info!("waiting for connection on port {port}");
            let (sock, addr) = listener.accept()?;
            info!("accepted {addr}");
            sock
        } else {
            info!("connecting to {input}");
            TcpStream::connect(input)?
        };

        Ok(Box::new(stream))
    } else {
        std::fs::File::open(input)
            .map(|i| Box::new(i) as _)
            .map_err(Into::into)
    }
}

/// Raw capture reader.
pub struct RawDumpSource<T> {
    reader: T,
    buf: Vec<u8>,
    width: usize,
    height: usize,
    frames: usize,
}

impl<T: Read> RawDumpSource<T> {
    /// Create a reader of `rows * cols` block frames.
    ///
    /// Fails with `MalformedGrid` if either dimension is zero.
    pub fn new(reader: T, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(mvregion::Error::MalformedGrid { rows, cols }.into());
        }

        Ok(Self {
            reader,
            buf: vec![0; rows * cols * std::mem::size_of::<MotionBlock>()],
            width: cols,
            height: rows,
            frames: 0,
        })
    }

    /// Fill the frame buffer.
    ///
    /// Returns `Ok(false)` if the stream ended exactly at a frame boundary.
    fn read_frame(&mut self) -> io::Result<bool> {
        let mut filled = 0;

        while filled < self.buf.len() {
            match self.reader.read(&mut self.buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("truncated frame ({filled} of {} bytes)", self.buf.len()),
                    ))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }

        Ok(true)
    }
}

impl<T: Read> MotionSource for RawDumpSource<T> {
    fn next_frame(&mut self, grid: &mut MotionGrid) -> Result<bool> {
        if !self.read_frame()? {
            return Ok(false);
        }

        if grid.dim() != (self.width, self.height) {
            *grid = MotionGrid::new(self.height, self.width);
        }

        grid.copy_from_bytes(&self.buf)?;
        self.frames += 1;

        Ok(true)
    }

    fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn frame_index(&self) -> usize {
        self.frames.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn capture(frames: &[MotionGrid]) -> Vec<u8> {
        frames.iter().flat_map(|g| g.as_bytes().to_vec()).collect()
    }

    #[test]
    fn reads_frames_until_end() {
        let mut a = MotionGrid::new(3, 4);
        a.set(1, 2, MotionBlock::new(5, -5, 300));
        let mut b = MotionGrid::new(3, 4);
        b.set(3, 0, MotionBlock::new(-1, 2, 7));

        let data = capture(&[a.clone(), b.clone()]);
        let mut source = RawDumpSource::new(Cursor::new(data), 3, 4).unwrap();
        let mut grid = MotionGrid::default();

        assert_eq!(source.dim(), (4, 3));

        assert!(source.next_frame(&mut grid).unwrap());
        assert_eq!(grid, a);
        assert_eq!(source.frame_index(), 0);

        assert!(source.next_frame(&mut grid).unwrap());
        assert_eq!(grid, b);
        assert_eq!(source.frame_index(), 1);

        assert!(!source.next_frame(&mut grid).unwrap());
        assert_eq!(grid, b);
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let mut data = capture(&[MotionGrid::new(2, 2)]);
        data.extend_from_slice(&[0; 5]);

        let mut source = RawDumpSource::new(Cursor::new(data), 2, 2).unwrap();
        let mut grid = MotionGrid::default();

        assert!(source.next_frame(&mut grid).unwrap());
        assert!(source.next_frame(&mut grid).is_err());
    }

    #[test]
    fn zero_dimensions_are_refused() {
        for (rows, cols) in [(0, 4), (4, 0), (0, 0)] {
            let err = RawDumpSource::new(Cursor::new(vec![0u8; 64]), rows, cols)
                .err()
                .unwrap();
            assert!(matches!(
                err.downcast_ref::<mvregion::Error>(),
                Some(mvregion::Error::MalformedGrid { .. })
            ));

            let err = create_source("/nonexistent/capture.data", rows, cols)
                .err()
                .unwrap();
            assert!(matches!(
                err.downcast_ref::<mvregion::Error>(),
                Some(&mvregion::Error::MalformedGrid { rows: r, cols: c }) if (r, c) == (rows, cols)
            ));
        }
    }

    #[test]
    fn bad_stream_address() {
        assert!(open_stream("tcp://localhost").is_err());
        assert!(open_stream("tcp://localhost:notaport").is_err());
    }
}

//! Image source trait and implementations for the supported containers
//!
//! Every read is positioned: callers pass the absolute byte offset they want,
//! so no cursor state is carried between decode operations.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chd::Chd;

/// A random-access byte source with a known total length
pub trait ImageSource: Send {
    /// Total length of the logical image in bytes
    fn len(&self) -> u64;

    /// Read into `buf` starting at the absolute byte `offset`
    ///
    /// Returns the number of bytes actually read. A count smaller than
    /// `buf.len()` means the image ended first; it is up to the caller to
    /// decide whether that is fatal.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, io::Error>;

    /// Whether the image holds no bytes at all
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: ImageSource + ?Sized> ImageSource for Box<S> {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, io::Error> {
        (**self).read_at(offset, buf)
    }
}

/// Image source over any seekable stream (plain ISO files, in-memory buffers)
pub struct StreamSource<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> StreamSource<R> {
    /// Wrap a stream, measuring its length by seeking to the end
    pub fn new(mut inner: R) -> Result<Self, io::Error> {
        let len = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, len })
    }

    /// Give back the wrapped stream
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl StreamSource<BufReader<File>> {
    /// Open a plain (uncompressed) disc image file
    pub fn open(path: &Path) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek + Send> ImageSource for StreamSource<R> {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, io::Error> {
        self.inner.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(filled)
    }
}

/// Image source for CHD containers holding a 2048-byte-sector DVD image
pub struct ChdSource {
    chd: Chd<BufReader<File>>,
    /// Hunk size in bytes
    hunk_size: u64,
    /// Total size of the uncompressed image
    logical_size: u64,
    /// Index of the hunk currently held in `hunk_buffer`
    cached_hunk: Option<u32>,
    /// Hunksized buffer for decompression
    hunk_buffer: Vec<u8>,
    /// Scratch buffer for compressed hunk data
    compressed_buffer: Vec<u8>,
}

impl ChdSource {
    /// Open a CHD file
    pub fn open(path: &Path) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        let chd = Chd::open(BufReader::new(file), None).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Failed to open CHD: {}", e))
        })?;

        let header = chd.header();
        let hunk_size = header.hunk_size() as u64;
        let logical_size = header.logical_bytes();
        log::debug!(
            "Opened CHD {}: hunk_size={}, logical_size={}",
            path.display(),
            hunk_size,
            logical_size
        );

        if hunk_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "CHD header reports a zero hunk size",
            ));
        }

        let hunk_buffer = chd.get_hunksized_buffer();
        Ok(Self {
            chd,
            hunk_size,
            logical_size,
            cached_hunk: None,
            hunk_buffer,
            compressed_buffer: Vec::new(),
        })
    }

    /// Decompress a hunk into `hunk_buffer` unless it is already there
    fn load_hunk(&mut self, hunk_index: u32) -> Result<(), io::Error> {
        if self.cached_hunk == Some(hunk_index) {
            return Ok(());
        }

        self.cached_hunk = None;
        self.chd
            .hunk(hunk_index)
            .map_err(|e| io::Error::other(format!("CHD hunk {}: {:?}", hunk_index, e)))?
            .read_hunk_in(&mut self.compressed_buffer, &mut self.hunk_buffer)
            .map_err(|e| io::Error::other(format!("CHD hunk {}: {:?}", hunk_index, e)))?;
        self.cached_hunk = Some(hunk_index);

        Ok(())
    }
}

impl ImageSource for ChdSource {
    fn len(&self) -> u64 {
        self.logical_size
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, io::Error> {
        if offset >= self.logical_size {
            return Ok(0);
        }

        let available = (self.logical_size - offset).min(buf.len() as u64) as usize;
        let mut filled = 0;

        // Reads may span several hunks
        while filled < available {
            let position = offset + filled as u64;
            let hunk_index = (position / self.hunk_size) as u32;
            let offset_in_hunk = (position % self.hunk_size) as usize;

            self.load_hunk(hunk_index)?;

            let count = (self.hunk_buffer.len() - offset_in_hunk).min(available - filled);
            if count == 0 {
                break;
            }
            buf[filled..filled + count]
                .copy_from_slice(&self.hunk_buffer[offset_in_hunk..offset_in_hunk + count]);
            filled += count;
        }

        Ok(filled)
    }
}

/// Sparse in-memory image: zeros everywhere except for explicit patches.
/// Lets tests place descriptors at the large XGD3/GDF offsets cheaply.
#[cfg(test)]
pub(crate) struct SparseSource {
    len: u64,
    patches: Vec<(u64, Vec<u8>)>,
}

#[cfg(test)]
impl SparseSource {
    pub(crate) fn new(len: u64) -> Self {
        Self {
            len,
            patches: Vec::new(),
        }
    }

    pub(crate) fn patch(&mut self, offset: u64, bytes: &[u8]) {
        self.patches.push((offset, bytes.to_vec()));
    }
}

#[cfg(test)]
impl ImageSource for SparseSource {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize, io::Error> {
        if offset >= self.len {
            return Ok(0);
        }
        let count = (self.len - offset).min(buf.len() as u64) as usize;
        buf[..count].fill(0);

        let end = offset + count as u64;
        for (start, bytes) in &self.patches {
            let patch_end = start + bytes.len() as u64;
            if *start >= end || patch_end <= offset {
                continue;
            }
            let from = offset.max(*start);
            let to = end.min(patch_end);
            let dst = (from - offset) as usize..(to - offset) as usize;
            let src = (from - start) as usize..(to - start) as usize;
            buf[dst].copy_from_slice(&bytes[src]);
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn test_stream_source_len_and_read() {
        let data: Vec<u8> = (0..=255u8).collect();
        let mut source = StreamSource::new(Cursor::new(data)).unwrap();

        assert_eq!(source.len(), 256);

        let mut buf = [0u8; 4];
        assert_eq!(source.read_at(10, &mut buf).unwrap(), 4);
        assert_eq!(buf, [10, 11, 12, 13]);
    }

    #[test]
    fn test_stream_source_short_read_at_end() {
        let mut source = StreamSource::new(Cursor::new(vec![1u8, 2, 3])).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(source.read_at(1, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[2, 3]);

        assert_eq!(source.read_at(100, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_stream_source_open_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".iso")
            .tempfile()
            .unwrap();
        file.write_all(b"XBOXDATA").unwrap();
        file.flush().unwrap();

        let mut source = StreamSource::open(file.path()).unwrap();
        assert_eq!(source.len(), 8);

        let mut buf = [0u8; 4];
        source.read_at(4, &mut buf).unwrap();
        assert_eq!(&buf, b"DATA");
    }

    #[test]
    fn test_boxed_source_forwards() {
        let inner = StreamSource::new(Cursor::new(vec![7u8; 16])).unwrap();
        let mut source: Box<dyn ImageSource> = Box::new(inner);

        assert_eq!(source.len(), 16);
        let mut buf = [0u8; 2];
        assert_eq!(source.read_at(14, &mut buf).unwrap(), 2);
        assert_eq!(buf, [7, 7]);
    }

    #[test]
    fn test_sparse_source_patches() {
        let mut source = SparseSource::new(1 << 30);
        source.patch(1_000_000, b"HELLO");

        let mut buf = [0xAAu8; 8];
        assert_eq!(source.read_at(999_998, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"\0\0HELLO\0");
    }

    #[test]
    fn test_chd_open_rejects_garbage() {
        let mut file = tempfile::Builder::new()
            .suffix(".chd")
            .tempfile()
            .unwrap();
        file.write_all(&[0u8; 256]).unwrap();
        file.flush().unwrap();

        assert!(ChdSource::open(file.path()).is_err());
    }
}

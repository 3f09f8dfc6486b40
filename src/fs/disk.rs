//! On-disk file system rooted at a directory.

use super::{FileSystem, Readable, Writable};
use crate::error::{Error, Result};
#[cfg(not(unix))]
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Maps blob names to files under a root directory.
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    root: PathBuf,
}

impl DiskFileSystem {
    /// Create a file system rooted at `root`, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Full path of a named blob
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl FileSystem for DiskFileSystem {
    type File = DiskFile;
    type Writer = DiskWriter;

    fn create(&self, name: &str) -> Result<DiskWriter> {
        DiskWriter::create(self.path(name))
    }

    fn open(&self, name: &str) -> Result<DiskFile> {
        DiskFile::open(self.path(name))
    }
}

/// A file opened for random-access reads.
///
/// A single handle may be used from many threads. On unix reads are
/// positional and never contend; elsewhere they seek under a mutex.
#[derive(Debug)]
pub struct DiskFile {
    #[cfg(unix)]
    file: File,
    #[cfg(not(unix))]
    file: Mutex<File>,
    size: u64,
}

impl DiskFile {
    /// Open the file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        #[cfg(not(unix))]
        let file = Mutex::new(file);
        Ok(Self { file, size })
    }
}

impl Readable for DiskFile {
    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        use std::os::unix::fs::FileExt;

        self.file.read_exact_at(buf, offset)?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        use std::io::{Read, Seek, SeekFrom};

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }
}

/// A buffered file opened for sequential writes.
#[derive(Debug)]
pub struct DiskWriter {
    writer: BufWriter<File>,
}

impl DiskWriter {
    /// Create (or truncate) the file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self { writer: BufWriter::new(file) })
    }
}

impl Writable for DiskWriter {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).map_err(Error::Io)
    }

    fn close(mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }
}

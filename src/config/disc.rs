//! Access to files on the disc.
//!
//! The console only exposes an asynchronous read for our purposes. A read is handed a buffer and a
//! `ReadSignal`; whatever performs the read stores the byte count in the signal when it finishes,
//! along with the buffer. The caller waits on the signal.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::{Duration, Instant},
};

use super::format::{round_up_32, READ_ALIGNMENT};

/// Something that files can be opened from.
pub trait Disc {
    type File: DiscFile;

    /// Opens the file at `path`, relative to the root of the disc.
    fn open(&self, path: &str) -> io::Result<Self::File>;
}

/// An open file on a `Disc`.
pub trait DiscFile {
    /// Length of the file in bytes.
    fn length(&self) -> usize;

    /// Starts reading into `buffer` from `offset`. The read is finished when `signal` leaves the
    /// pending state. An error means the read was never started.
    fn read_async(&mut self, buffer: AlignedBuffer, offset: u64, signal: ReadSignal)
        -> io::Result<()>;

    fn close(self);
}

/// A byte buffer whose contents start on a `READ_ALIGNMENT` boundary.
///
/// We can't choose the alignment of the allocation, so one extra alignment unit is allocated and
/// the window is moved forward to the first aligned address inside it.
pub struct AlignedBuffer {
    storage: Vec<u8>,
    start: usize,
    len: usize,
}

impl AlignedBuffer {
    /// Creates a zeroed buffer of at least `len` bytes, rounded up to the read unit.
    pub fn new(len: usize) -> AlignedBuffer {
        let len = round_up_32(len);
        let storage = vec![0u8; len + READ_ALIGNMENT];

        let base = storage.as_ptr() as usize;
        let start = round_up_32(base) - base;

        AlignedBuffer {
            storage,
            start,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.start..self.start + self.len]
    }
}

/// How a read finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The read finished, having transferred this many bytes.
    Read(usize),

    /// The read was started but could not finish.
    Failed,
}

const PENDING: i64 = -1;
const FAILED: i64 = -2;

struct SignalState {
    bytes_read: AtomicI64,
    buffer: Mutex<Option<AlignedBuffer>>,
}

/// The completion value shared between a reader and whatever finishes the read.
#[derive(Clone)]
pub struct ReadSignal {
    state: Arc<SignalState>,
}

impl ReadSignal {
    pub fn new() -> ReadSignal {
        ReadSignal {
            state: Arc::new(SignalState {
                bytes_read: AtomicI64::new(PENDING),
                buffer: Mutex::new(None),
            }),
        }
    }

    fn store_buffer(&self, buffer: Option<AlignedBuffer>) {
        *self
            .state
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = buffer;
    }

    /// Finishes the read, handing the filled buffer back.
    pub fn complete(&self, bytes_read: usize, buffer: AlignedBuffer) {
        self.store_buffer(Some(buffer));

        // The buffer must be in place before anyone can see a terminal value.
        self.state
            .bytes_read
            .store(bytes_read as i64, Ordering::Release);
    }

    /// Finishes the read unsuccessfully.
    pub fn fail(&self, buffer: Option<AlignedBuffer>) {
        self.store_buffer(buffer);
        self.state.bytes_read.store(FAILED, Ordering::Release);
    }

    /// Returns the completion, or `None` if the read is still pending.
    pub fn poll(&self) -> Option<Completion> {
        match self.state.bytes_read.load(Ordering::Acquire) {
            PENDING => None,
            n if n >= 0 => Some(Completion::Read(n as usize)),
            _ => Some(Completion::Failed),
        }
    }

    /// Blocks the calling thread until the read finishes. The thread yields between polls. With
    /// `timeout` set to `None` this waits forever, otherwise `None` is returned once the timeout
    /// has passed without a completion.
    pub fn wait(&self, timeout: Option<Duration>) -> Option<Completion> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        loop {
            if let Some(completion) = self.poll() {
                return Some(completion);
            }

            if matches!(deadline, Some(deadline) if Instant::now() >= deadline) {
                return None;
            }

            thread::yield_now();
        }
    }

    /// Takes the buffer handed back by the read.
    pub fn take_buffer(&self) -> Option<AlignedBuffer> {
        self.state
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Default for ReadSignal {
    fn default() -> Self {
        ReadSignal::new()
    }
}

/// A disc backed by a directory. Reads are finished from a worker thread.
pub struct FsDisc {
    root: PathBuf,
}

impl FsDisc {
    pub fn new(root: impl AsRef<Path>) -> FsDisc {
        FsDisc {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl Disc for FsDisc {
    type File = FsFile;

    fn open(&self, path: &str) -> io::Result<FsFile> {
        let path = self.root.join(path);
        let file = File::open(&path)?;
        let length = file.metadata()?.len() as usize;

        Ok(FsFile { file, length, path })
    }
}

pub struct FsFile {
    file: File,
    length: usize,
    path: PathBuf,
}

/// Reads until `buf` is full or the reader runs out of data.
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }

    Ok(filled)
}

impl DiscFile for FsFile {
    fn length(&self) -> usize {
        self.length
    }

    fn read_async(
        &mut self,
        mut buffer: AlignedBuffer,
        offset: u64,
        signal: ReadSignal,
    ) -> io::Result<()> {
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(offset))?;

        let path = self.path.clone();

        thread::Builder::new()
            .name("disc-read".to_string())
            .spawn(move || match read_up_to(&mut file, buffer.as_mut_slice()) {
                Ok(bytes_read) => signal.complete(bytes_read, buffer),

                Err(err) => {
                    log::warn!("Error reading '{}': {err}", path.display());
                    signal.fail(Some(buffer));
                }
            })?;

        Ok(())
    }

    fn close(self) {
        log::debug!("Closing '{}'", self.path.display());
    }
}

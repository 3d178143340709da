use std::io;
use std::path::Path;

// ---------------------------------------------------------------------------
// SourceReader – the single point where raw bytes enter the process
// ---------------------------------------------------------------------------

/// Reads a whole source file (dataset or pipeline artifact) into memory.
///
/// The caches call this at most once per successful load, so an
/// implementation that counts calls observes exactly the I/O performed.
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl SourceReader for FsSource {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::SourceReader;

    /// In-memory files with a read counter.
    #[derive(Default)]
    pub struct MemorySource {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
        reads: AtomicUsize,
    }

    impl MemorySource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_file(self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
            self.insert(path, contents);
            self
        }

        pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
            self.files
                .lock()
                .unwrap()
                .insert(path.into(), contents.into());
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl SourceReader for MemorySource {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }
}

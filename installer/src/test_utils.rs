//! Shared test utilities for the installer crate.

use crate::bundle::BundleAssets;
use crate::layout::{SplitLocation, SplitPathManager};
use crate::split::SplitName;
use crate::validator::SignatureValidator;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::VecDeque;
use std::fs;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};

/// An in-memory bundle serving the same payload for every asset.
///
/// The first `failures` reads fail with an I/O error; later reads succeed.
/// Every read is counted, successful or not.
#[derive(Debug)]
pub struct StubBundle {
    payload: Vec<u8>,
    failures: u32,
    opens: AtomicU32,
}

impl StubBundle {
    /// Serve `payload` for every asset.
    #[must_use]
    pub fn new(payload: &[u8]) -> Self {
        Self {
            payload: payload.to_vec(),
            failures: 0,
            opens: AtomicU32::new(0),
        }
    }

    /// Fail the first `failures` reads.
    #[must_use]
    pub fn failing_first(mut self, failures: u32) -> Self {
        self.failures = failures;
        self
    }

    /// Number of reads attempted so far.
    #[must_use]
    pub fn open_count(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

impl BundleAssets for StubBundle {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        let attempt = self.opens.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if attempt <= self.failures {
            return Err(io::Error::other(format!(
                "simulated read failure {attempt} for {name}"
            )));
        }
        Ok(Box::new(Cursor::new(self.payload.clone())))
    }
}

/// A validator answering from a queue of verdicts.
///
/// Once the queue is empty every call returns the fallback verdict.
#[derive(Debug)]
pub struct ScriptedValidator {
    verdicts: Mutex<VecDeque<bool>>,
    fallback: bool,
    calls: AtomicU32,
}

impl ScriptedValidator {
    /// Answer `verdicts` in order, then `fallback`.
    #[must_use]
    pub fn new(verdicts: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            verdicts: Mutex::new(verdicts.into_iter().collect()),
            fallback,
            calls: AtomicU32::new(0),
        }
    }

    /// Answer `verdict` to every call.
    #[must_use]
    pub fn always(verdict: bool) -> Self {
        Self::new([], verdict)
    }

    /// Number of validations performed so far.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SignatureValidator for ScriptedValidator {
    fn validate(&self, _split: &SplitName, _artifact: &Utf8Path) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdicts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

/// A storage root inside a temporary directory.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct TempStorage {
    _temp: tempfile::TempDir,
    paths: SplitPathManager,
}

impl TempStorage {
    /// Create an empty storage root.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created or its
    /// path is not valid UTF-8.
    pub fn new() -> io::Result<Self> {
        let temp = tempfile::tempdir()?;
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self {
            _temp: temp,
            paths: SplitPathManager::new(root.join("splits")),
        })
    }

    /// Path manager rooted in the temporary directory.
    #[must_use]
    pub fn paths(&self) -> &SplitPathManager {
        &self.paths
    }

    /// Location of `split` under this storage root.
    #[must_use]
    pub fn location(&self, split: &SplitName) -> SplitLocation {
        self.paths.location(split)
    }

    /// Write `bytes` as `split`'s artifact, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while writing.
    pub fn plant_artifact(&self, split: &SplitName, bytes: &[u8]) -> io::Result<SplitLocation> {
        let location = self.location(split);
        fs::create_dir_all(location.split_dir())?;
        fs::write(location.artifact(), bytes)?;
        Ok(location)
    }

    /// Number of entries in the scratch directory; zero when it is absent.
    #[must_use]
    pub fn scratch_entries(&self) -> usize {
        fs::read_dir(self.paths.tmp_dir()).map_or(0, Iterator::count)
    }
}

use std::{
    fs,
    io::{self, Write},
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use crate::domain::DomainError;

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    SerdeJson(serde_json::Error),
    Domain(DomainError),
    InvalidDocument { reason: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::SerdeJson(e) => write!(f, "json error: {e}"),
            Self::Domain(e) => write!(f, "{e}"),
            Self::InvalidDocument { reason } => write!(f, "invalid document: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::SerdeJson(e) => Some(e),
            Self::Domain(e) => Some(e),
            Self::InvalidDocument { .. } => None,
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::SerdeJson(value)
    }
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        Self::Domain(value)
    }
}

/// Durable home of a single document. Every call works on the whole
/// document; there are no partial reads or writes.
pub trait DocumentBackend<D>: Send + Sync {
    fn load(&self) -> Result<D, StoreError>;
    fn save(&self, doc: &D) -> Result<(), StoreError>;
}

impl<D, B> DocumentBackend<D> for Arc<B>
where
    B: DocumentBackend<D> + ?Sized,
{
    fn load(&self) -> Result<D, StoreError> {
        (**self).load()
    }

    fn save(&self, doc: &D) -> Result<(), StoreError> {
        (**self).save(doc)
    }
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug)]
pub struct JsonFileBackend<D> {
    path: PathBuf,
    _doc: PhantomData<fn() -> D>,
}

impl<D> JsonFileBackend<D>
where
    D: Serialize + DeserializeOwned + Default,
{
    /// Opens `path`, writing an empty document first if nothing is there yet.
    pub fn open_or_init(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let backend = Self {
            path: path.into(),
            _doc: PhantomData,
        };

        if !backend.path.exists() {
            if let Some(dir) = backend.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }
            backend.save(&D::default())?;
            info!(path = %backend.path.display(), "initialized document");
        }

        Ok(backend)
    }
}

impl<D> DocumentBackend<D> for JsonFileBackend<D>
where
    D: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<D, StoreError> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, doc: &D) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }
}

/// Keeps the document in memory. Loads hand out clones, so callers still go
/// through a real load/mutate/save cycle.
#[derive(Debug, Default)]
pub struct MemoryBackend<D> {
    doc: Mutex<D>,
    saves: AtomicUsize,
}

impl<D: Clone> MemoryBackend<D> {
    pub fn new(doc: D) -> Self {
        Self {
            doc: Mutex::new(doc),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn snapshot(&self) -> D {
        self.doc
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }
}

impl<D> DocumentBackend<D> for MemoryBackend<D>
where
    D: Clone + Send,
{
    fn load(&self) -> Result<D, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, doc: &D) -> Result<(), StoreError> {
        *self.doc.lock().unwrap_or_else(PoisonError::into_inner) = doc.clone();
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

pub struct DocumentStore<D> {
    backend: Box<dyn DocumentBackend<D>>,
}

impl<D> DocumentStore<D> {
    pub fn new(backend: impl DocumentBackend<D> + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn read(&self) -> Result<D, StoreError> {
        self.backend.load()
    }

    /// Loads the document, applies `f` and persists the result. Nothing is
    /// written when `f` fails.
    ///
    /// Taking `&mut self` means callers sharing a store must already hold
    /// exclusive access, which keeps the cycle free of lost updates.
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&mut D) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut doc = self.backend.load()?;
        let out = f(&mut doc)?;
        self.backend.save(&doc)?;
        Ok(out)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), io::Error> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        let _ = file.sync_all();
    }

    #[cfg(windows)]
    {
        if path.exists() {
            let _ = fs::remove_file(path);
        }
    }

    fs::rename(tmp_path, path)?;
    Ok(())
}

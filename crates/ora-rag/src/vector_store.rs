//! Flat L2 vector index with parallel chunk metadata and atomic persistence

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

use ora_core::{Chunk, Error, Result};

const STORE_FILE: &str = "store.json";

/// One nearest-neighbor hit: position in the index plus L2 distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub position: usize,
    pub distance: f32,
}

/// Outcome of a search against the index.
///
/// `NotReady` is the distinguished empty-index result so callers can
/// answer gracefully instead of erroring before any ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    NotReady,
    Hits(Vec<Hit>),
}

/// The single persisted artifact: vectors and chunks travel together so
/// a crash can never leave one side newer than the other.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreArtifact {
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

/// The in-memory flat index: parallel vector and chunk arrays.
///
/// Position is the only join key between the two arrays; insertion order
/// is retrieval-significant and the length invariant is checked on every
/// mutation.
#[derive(Debug, Default)]
struct FlatIndex {
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

impl FlatIndex {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn check_invariant(&self) -> Result<()> {
        if self.vectors.len() != self.chunks.len() {
            return Err(Error::Consistency(format!(
                "{} vectors but {} chunks",
                self.vectors.len(),
                self.chunks.len()
            )));
        }
        Ok(())
    }

    fn add(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::Consistency(format!(
                "add() called with {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let dim = match self.dimension {
            Some(dim) => dim,
            None => {
                let dim = embeddings[0].len();
                if dim == 0 {
                    return Err(Error::Embedding("embedding has zero dimension".to_string()));
                }
                self.dimension = Some(dim);
                dim
            }
        };

        for vector in &embeddings {
            if vector.len() != dim {
                return Err(Error::Embedding(format!(
                    "embedding dimension {} does not match index dimension {}",
                    vector.len(),
                    dim
                )));
            }
        }

        self.vectors.extend(embeddings);
        self.chunks.extend(chunks);
        self.check_invariant()
    }

    fn search(&self, query: &[f32], k: usize) -> Result<SearchOutcome> {
        if self.vectors.is_empty() {
            return Ok(SearchOutcome::NotReady);
        }
        let dim = self.dimension.unwrap_or(0);
        if query.len() != dim {
            return Err(Error::Configuration(format!(
                "query embedding dimension {} does not match index dimension {}",
                query.len(),
                dim
            )));
        }

        let mut hits: Vec<Hit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Hit {
                position,
                distance: l2_distance(query, vector),
            })
            .collect();

        // Ascending distance, ties broken by insertion position.
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);

        Ok(SearchOutcome::Hits(hits))
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Shared, lazily-loaded vector index store.
///
/// The store is constructed once per process and handed around by
/// `Arc`; the inner lock guarantees readers see either the pre- or
/// post-ingestion index, never a partially written one. On disk the
/// whole index lives in one JSON artifact replaced by a single rename,
/// so the vectors and the chunk metadata are swapped as a unit.
pub struct VectorIndexStore {
    dir: PathBuf,
    inner: RwLock<State>,
}

#[derive(Default)]
struct State {
    loaded: bool,
    index: FlatIndex,
}

impl VectorIndexStore {
    /// Create a store backed by `dir`; nothing is read until first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            inner: RwLock::new(State::default()),
        }
    }

    /// Look up chunks by index position, in the given order.
    pub fn chunks_at(&self, positions: &[usize]) -> Result<Vec<Chunk>> {
        self.ensure_loaded()?;
        let state = self.read_lock()?;
        positions
            .iter()
            .map(|&position| {
                state.index.chunks.get(position).cloned().ok_or_else(|| {
                    Error::Consistency(format!(
                        "search returned position {} but only {} chunks are stored",
                        position,
                        state.index.chunks.len()
                    ))
                })
            })
            .collect()
    }

    /// Append chunks and their embeddings, then persist atomically.
    pub fn add(&self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        self.ensure_loaded()?;
        let mut state = self.write_lock()?;
        state.index.add(chunks, embeddings)?;
        self.persist(&state.index)
    }

    /// K-nearest-neighbor search by L2 distance.
    pub fn search(&self, query: &[f32], k: usize) -> Result<SearchOutcome> {
        self.ensure_loaded()?;
        let state = self.read_lock()?;
        state.index.search(query, k)
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> Result<usize> {
        self.ensure_loaded()?;
        Ok(self.read_lock()?.index.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Load the persisted artifact on first access; later calls are
    /// no-ops.
    fn ensure_loaded(&self) -> Result<()> {
        if self.read_lock()?.loaded {
            return Ok(());
        }
        let mut state = self.write_lock()?;
        // Another caller may have loaded while we waited on the lock.
        if state.loaded {
            return Ok(());
        }

        let store_path = self.dir.join(STORE_FILE);
        if !store_path.exists() {
            // Fresh deployment: empty index until first ingestion.
            state.loaded = true;
            return Ok(());
        }

        let artifact: StoreArtifact = read_json(&store_path)?;
        if artifact.vectors.len() != artifact.chunks.len() {
            return Err(Error::Consistency(format!(
                "persisted index has {} vectors but {} chunks",
                artifact.vectors.len(),
                artifact.chunks.len()
            )));
        }
        state.index = FlatIndex {
            dimension: artifact.dimension,
            vectors: artifact.vectors,
            chunks: artifact.chunks,
        };
        state.loaded = true;
        Ok(())
    }

    /// Serialize the whole index into a temp file in the target
    /// directory and rename it into place in one step.
    fn persist(&self, index: &FlatIndex) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let artifact = StoreArtifact {
            dimension: index.dimension,
            vectors: index.vectors.clone(),
            chunks: index.chunks.clone(),
        };
        let json = serde_json::to_vec(&artifact)
            .map_err(|e| Error::Serialization(e.to_string()))?;

        stage(&self.dir, &json)?
            .persist(self.dir.join(STORE_FILE))
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|e| Error::Consistency(format!("index lock poisoned: {}", e)))
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|e| Error::Consistency(format!("index lock poisoned: {}", e)))
    }
}

fn stage(dir: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.flush()?;
    Ok(file)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| {
        Error::Serialization(format!("failed to parse {}: {}", path.display(), e))
    })
}

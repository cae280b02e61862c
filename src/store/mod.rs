mod images;

pub use images::ImagePool;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

/// How a store writes newly recorded entities back to disk.
///
/// Both policies occur in deployed scenario data files, so the store keeps
/// them configurable instead of unifying them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistMode {
    /// Append one JSON line per record (canonical format).
    AppendLine,
    /// Rewrite the whole collection as a JSON array after each record.
    RewriteSnapshot,
}

/// Append-only, file-backed collection of entities seen so far.
///
/// Loaded once at startup and appended on each successful creation response.
/// Disk writes are best-effort: failures are logged and the in-memory
/// collection stays authoritative for the rest of the run. There is no file
/// locking; concurrent writers from parallel processes may interleave lines.
/// That matches the behavior of the scenario scripts this replaces and is a
/// documented limitation, not a bug to fix here.
pub struct EntityStore<T> {
    path: PathBuf,
    mode: PersistMode,
    items: Vec<T>,
}

impl<T: Serialize + DeserializeOwned> EntityStore<T> {
    /// Load prior data from `path`, or start empty when the file is missing
    /// or unreadable. Never fails: a load-test run must not abort because a
    /// seed file is absent or corrupt.
    pub fn load(path: impl Into<PathBuf>, mode: PersistMode) -> Self {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(contents) => match parse_collection(&contents) {
                Ok(items) => {
                    debug!("loaded {} records from {}", items.len(), path.display());
                    items
                }
                Err(err) => {
                    warn!("ignoring corrupt data file {}: {err:#}", path.display());
                    Vec::new()
                }
            },
            Err(err) => {
                debug!("no prior data at {} ({err})", path.display());
                Vec::new()
            }
        };
        Self { path, mode, items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Record an entity in memory and, best-effort, on disk.
    pub fn push(&mut self, entity: T) {
        self.items.push(entity);
        if let Err(err) = self.persist_last() {
            warn!("failed to persist record to {}: {err:#}", self.path.display());
        }
    }

    /// Record the entity carried in a creation response, but only when the
    /// request actually succeeded: status in `[200, 300)` and a non-empty
    /// body. Everything else is logged and skipped, including a 2xx body
    /// that does not parse. Returns whether a record was added.
    pub fn record_on_success(&mut self, status: u16, body: &str) -> bool {
        if !(200..300).contains(&status) || body.is_empty() {
            warn!("not recording response (status {status}): {body}");
            return false;
        }
        match serde_json::from_str::<T>(body) {
            Ok(entity) => {
                self.push(entity);
                true
            }
            Err(err) => {
                warn!("unparseable response body ({err}): {body}");
                false
            }
        }
    }

    fn persist_last(&self) -> Result<()> {
        match self.mode {
            PersistMode::AppendLine => {
                let entity = self.items.last().context("nothing to persist")?;
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .context("open data file for append")?;
                let line = serde_json::to_string(entity).context("serialize record")?;
                writeln!(file, "{line}").context("append record")?;
            }
            PersistMode::RewriteSnapshot => {
                let snapshot = serde_json::to_string(&self.items).context("serialize snapshot")?;
                fs::write(&self.path, snapshot).context("write snapshot")?;
            }
        }
        Ok(())
    }
}

/// Parse a backing file that is either a JSON array or newline-delimited
/// JSON objects. Whole-file array parse is tried first; the line-by-line
/// fallback skips blank lines.
fn parse_collection<T: DeserializeOwned>(contents: &str) -> Result<Vec<T>> {
    if let Ok(items) = serde_json::from_str::<Vec<T>>(contents) {
        return Ok(items);
    }
    let mut items = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item =
            serde_json::from_str(line).with_context(|| format!("line {}", lineno + 1))?;
        items.push(item);
    }
    Ok(items)
}

/// Load the ids of every record in a backing file, tolerating either format.
/// Used by scripts that only need foreign keys, not full records.
pub fn load_ids(path: &Path) -> Vec<String> {
    #[derive(serde::Serialize, serde::Deserialize)]
    struct IdOnly {
        id: String,
    }
    let store: EntityStore<IdOnly> = EntityStore::load(path, PersistMode::AppendLine);
    store.items.into_iter().map(|r| r.id).collect()
}

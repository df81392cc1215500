use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};

/// Fixed key the bearer token lives under.
pub const TOKEN_KEY: &str = "CHURCHMAN_TOKEN_AUTH_KEY";

/// Durable key/value slot storage, the client-side equivalent of browser local storage.
pub trait TokenBackend: Send + Sync {
    fn load(&self, key: &str) -> ClientResult<Option<String>>;
    fn save(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self { Self::default() }
}

impl TokenBackend for MemoryBackend {
    fn load(&self, key: &str) -> ClientResult<Option<String>> { Ok(self.slots.read().get(key).cloned()) }
    fn save(&self, key: &str, value: &str) -> ClientResult<()> {
        self.slots.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
    fn remove(&self, key: &str) -> ClientResult<()> {
        self.slots.write().remove(key);
        Ok(())
    }
}

/// JSON object file: `{"CHURCHMAN_TOKEN_AUTH_KEY": "<token>"}`. Unknown keys are preserved.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    // serializes read-modify-write of the file within this process
    io: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into(), io: Mutex::new(()) } }

    pub fn path(&self) -> &Path { &self.path }

    fn read_map(&self) -> ClientResult<Map<String, Value>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(ClientError::storage(format!("read {}: {}", self.path.display(), e))),
        };
        if text.trim().is_empty() { return Ok(Map::new()); }
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(m)) => Ok(m),
            Ok(_) | Err(_) => {
                tracing::warn!(target: "churchman::session", "session file {} is not a JSON object; starting empty", self.path.display());
                Ok(Map::new())
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ClientError::storage(format!("create {}: {}", parent.display(), e)))?;
            }
        }
        let text = serde_json::to_string_pretty(map).map_err(|e| ClientError::storage(e.to_string()))?;
        // write-then-rename so a crash never leaves a half-written slot
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, text.as_bytes()).map_err(|e| ClientError::storage(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| ClientError::storage(format!("rename into {}: {}", self.path.display(), e)))?;
        Ok(())
    }
}

/// Create or truncate `path` readable by the owner only; it holds a bearer credential.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut f = opts.open(path)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    // mode() only applies on creation; tighten a leftover tmp file too
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        f.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

impl TokenBackend for FileBackend {
    fn load(&self, key: &str) -> ClientResult<Option<String>> {
        let _g = self.io.lock();
        let map = self.read_map()?;
        Ok(match map.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            // anything else was written by another tool; hand back its JSON text
            Some(other) => Some(other.to_string()),
        })
    }

    fn save(&self, key: &str, value: &str) -> ClientResult<()> {
        let _g = self.io.lock();
        let mut map = self.read_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let _g = self.io.lock();
        let mut map = self.read_map()?;
        if map.remove(key).is_some() { self.write_map(&map)?; }
        Ok(())
    }
}

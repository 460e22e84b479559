//! File-backed tier override table.
//!
//! A small JSON object mapping user id to tier, read once at startup and
//! rewritten on every admin override. Writes go through a temp file and
//! rename so a crash mid-write never leaves a torn table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use gatehouse_core::collaborators::PlanStore;
use gatehouse_types::error::PlanStoreError;
use gatehouse_types::identity::UserId;
use gatehouse_types::tier::Tier;

/// JSON-file implementation of `PlanStore`.
#[derive(Debug)]
pub struct FilePlanStore {
    path: PathBuf,
    // In-memory copy of the table; the file is the durable side.
    table: RwLock<HashMap<UserId, Tier>>,
}

impl FilePlanStore {
    /// Open the table at `path`, creating an empty one if the file is absent.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PlanStoreError> {
        let path = path.into();
        let table = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let parsed: HashMap<String, Tier> = serde_json::from_str(&raw)
                    .map_err(|e| PlanStoreError::Corrupt(e.to_string()))?;
                let mut table = HashMap::with_capacity(parsed.len());
                for (key, tier) in parsed {
                    let id: u64 = key
                        .parse()
                        .map_err(|_| PlanStoreError::Corrupt(format!("bad user id '{key}'")))?;
                    table.insert(UserId(id), tier);
                }
                table
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(PlanStoreError::Io(err.to_string())),
        };

        info!(path = %path.display(), overrides = table.len(), "plan override table loaded");
        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    async fn persist(&self, snapshot: HashMap<UserId, Tier>) -> Result<(), PlanStoreError> {
        let serializable: HashMap<String, Tier> = snapshot
            .into_iter()
            .map(|(user, tier)| (user.0.to_string(), tier))
            .collect();
        let raw = serde_json::to_string_pretty(&serializable)
            .map_err(|e| PlanStoreError::Io(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PlanStoreError::Io(e.to_string()))?;
        }
        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| PlanStoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| PlanStoreError::Io(e.to_string()))?;
        debug!(path = %self.path.display(), "plan override table written");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

impl PlanStore for FilePlanStore {
    async fn get(&self, user: UserId) -> Result<Option<Tier>, PlanStoreError> {
        Ok(self.table.read().unwrap().get(&user).copied())
    }

    async fn put(&self, user: UserId, tier: Tier) -> Result<(), PlanStoreError> {
        let snapshot = {
            let mut table = self.table.write().unwrap();
            table.insert(user, tier);
            table.clone()
        };
        self.persist(snapshot).await
    }
}

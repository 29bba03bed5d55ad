/**
 * PERSISTANCE - Sauvegarde JSON du snapshot publié
 *
 * Format : objet JSON identifiant navire -> objet de champs, identique à GET /state.
 * Au démarrage : fichier absent = départ à vide ; contenu invalide = log + départ à vide.
 * Après chaque publication : réécriture complète du fichier, en best-effort.
 */

use crate::models::Snapshot;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` si le fichier n'existe pas.
    pub async fn read(&self) -> Result<Option<Snapshot>, PersistenceError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistenceError::Json {
                path: self.path.clone(),
                source,
            })
    }

    /// Ne fait jamais échouer le démarrage.
    pub async fn load_or_empty(&self) -> Snapshot {
        match self.read().await {
            Ok(Some(snapshot)) => {
                info!("loaded vessel state from {} ({} vessels)", self.path.display(), snapshot.len());
                snapshot
            }
            Ok(None) => {
                info!("no state file at {}, starting fresh", self.path.display());
                Snapshot::new()
            }
            Err(e) => {
                warn!("{e}; starting with empty state");
                Snapshot::new()
            }
        }
    }

    /// Écrit un snapshot déjà encodé (celui qui vient d'être diffusé).
    pub async fn write_json(&self, json: &str) -> Result<(), PersistenceError> {
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| PersistenceError::Io {
                path: self.path.clone(),
                source,
            })
    }

    pub async fn write(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let json = snapshot.to_json().map_err(|source| PersistenceError::Json {
            path: self.path.clone(),
            source,
        })?;
        self.write_json(&json).await
    }

    /// Best-effort : une erreur est loggée, jamais propagée.
    pub async fn save(&self, json: &str) {
        if let Err(e) = self.write_json(json).await {
            error!("error writing state file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldSet, VesselRecord};
    use serde_json::json;

    fn sample() -> Snapshot {
        let fields: FieldSet = json!({
            "UserID": 244660000u64,
            "Latitude": 51.95,
            "Longitude": 4.05,
            "CallSign": "PDAB",
            "Dimension": {"A": 100, "B": 20, "C": 10, "D": 12},
            "LastUpdated": "2025-03-14T12:30:05.123456789Z",
            "NumMessages": 7
        })
        .as_object()
        .cloned()
        .unwrap();
        [("244660000".to_string(), VesselRecord::from_fields(fields))]
            .into_iter()
            .collect()
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        assert!(file.read().await.unwrap().is_none());
        assert!(file.load_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let file = StateFile::new(&path);
        assert!(matches!(file.read().await, Err(PersistenceError::Json { .. })));
        assert!(file.load_or_empty().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read_reproduces_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        let snapshot = sample();
        file.write(&snapshot).await.unwrap();
        assert_eq!(file.read().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("state.json"));
        file.write(&sample()).await.unwrap();
        file.write(&Snapshot::new()).await.unwrap();
        assert_eq!(file.read().await.unwrap(), Some(Snapshot::new()));
    }

    #[tokio::test]
    async fn test_save_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("missing-dir").join("state.json"));
        file.save("{}").await;
        assert!(file.read().await.unwrap().is_none());
    }
}

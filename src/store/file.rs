//! JSON file backend for the leaderboard

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{LeaderboardStore, Standings, StoreError};

/// Persists standings as a pretty-printed JSON object (`{"name": wins}`)
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeaderboardStore for JsonFileStore {
    fn load(&self) -> Result<Standings, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Standings::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        if raw.trim().is_empty() {
            return Ok(Standings::new());
        }

        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, standings: &Standings) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        // Write next to the target and rename so readers never see a torn file
        let json = serde_json::to_string_pretty(standings)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("snowball-{}", Uuid::new_v4().simple()))
            .join("leaderboard.json")
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = JsonFileStore::new(scratch_path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn empty_file_loads_empty() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "  \n").unwrap();
        assert!(JsonFileStore::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn save_creates_directory_and_reloads() {
        let path = scratch_path();
        let store = JsonFileStore::new(&path);

        let mut standings = Standings::new();
        standings.insert("Alice".to_string(), 3);
        standings.insert("Bob".to_string(), 1);
        store.save(&standings).unwrap();

        assert_eq!(store.load().unwrap(), standings);
        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["Alice"], 3);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileStore::new(&path).load(),
            Err(StoreError::Parse(_))
        ));
    }
}

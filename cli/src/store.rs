use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sorte_core::{KeyValueStore, StoreError};

/// Key-value slots kept as one JSON object in a file, the on-disk stand-in for `localStorage`.
#[derive(Clone, Debug)]
pub(crate) struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(StoreError::Unavailable(err.to_string())),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|err| {
            StoreError::Unavailable(format!("{} is not a store file: {}", self.path.display(), err))
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(items)
            .map_err(|err| StoreError::WriteFailed(err.to_string()))?;
        // write then rename so a crash never leaves a half-written store
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(|err| StoreError::WriteFailed(err.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|err| StoreError::WriteFailed(err.to_string()))
    }

    /// Existing slots, or an empty set when the file is unreadable so a write can replace it.
    /// The unreadable file is copied to `<store>.bak` first.
    fn read_for_update(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.read_all() {
            Ok(items) => Ok(items),
            Err(err) => {
                let backup = self.backup_path();
                fs::copy(&self.path, &backup).map_err(|copy_err| {
                    StoreError::WriteFailed(format!(
                        "could not back up {} to {}: {}",
                        self.path.display(),
                        backup.display(),
                        copy_err
                    ))
                })?;
                log::warn!(
                    "replacing unreadable store {} ({}), old content kept in {}",
                    self.path.display(),
                    err,
                    backup.display()
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut items = self.read_for_update()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut items = self.read_for_update()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sorte_core::{LotteryGame, SlotGame, StorageKey, load, load_or_default, save};

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn slots_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("sorte.json"));
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn games_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("sorte.json"));
        let mut slot = SlotGame::new();
        slot.adjust_bet(2.0);
        let lottery = LotteryGame::new();
        assert!(save(&mut store, &slot));
        assert!(save(&mut store, &lottery));

        let reopened = FileStore::new(store.path());
        assert_eq!(load::<SlotGame>(&reopened).unwrap(), slot);
        assert_eq!(load::<LotteryGame>(&reopened).unwrap(), lottery);
    }

    #[test]
    fn corrupt_file_degrades_to_defaults_and_is_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sorte.json");
        fs::write(&path, "not json at all").unwrap();
        let mut store = FileStore::new(&path);
        assert!(store.get(<SlotGame as StorageKey>::KEY).is_err());
        assert_eq!(load_or_default::<SlotGame>(&store), SlotGame::default());

        let slot = SlotGame::new();
        assert!(save(&mut store, &slot));
        assert_eq!(load::<SlotGame>(&store).unwrap(), slot);
        assert_eq!(
            fs::read_to_string(store.backup_path()).unwrap(),
            "not json at all"
        );
    }
}

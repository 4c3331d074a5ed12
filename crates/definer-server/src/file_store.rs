//! TOML file persistence.

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use definer_core::{Snapshot, Store, StoreError};

/// Hub state kept in a single TOML file.
///
/// Saves go to a sibling temporary file that is renamed over the target, so a
/// crash mid-save leaves the previous state intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at `path`. Nothing is read until [`Store::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Store for FileStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        toml::from_str(&contents)
            .map(Some)
            .map_err(|err| StoreError::Corrupt(format!("{}: {err}", self.path.display())))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let encoded =
            toml::to_string_pretty(snapshot).map_err(|err| StoreError::Encode(err.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp)?;
        file.write_all(encoded.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use definer_core::{Device, Peer, Router};
    use definer_proto::DeviceType;

    use super::*;

    fn snapshot() -> Snapshot {
        let mut router = Router::new("hub-a.local");
        router.ssid = "home".into();
        router.password = "pw".into();

        let mut snapshot = Snapshot::new(router);
        snapshot.room.name = "kitchen".into();
        snapshot.devices.push(Device {
            id: "dev-1".into(),
            version: "2.1".into(),
            manufacturer: "acme".into(),
            stack: "wifi".into(),
            address: "10.0.0.5".into(),
            port: 9000,
            kind: DeviceType::new("light", "ceiling"),
        });
        snapshot.peers.push(Peer::new("hub-b.local", "", 13789));
        snapshot
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("definer.toml"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_state_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state").join("definer.toml"));

        store.save(&snapshot()).unwrap();
        assert_eq!(store.load().unwrap(), Some(snapshot()));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definer.toml");
        fs::write(&path, "router = [not toml").unwrap();

        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("definer.toml");
        fs::write(&path, "[router]\nhostname = \"hub-a.local\"\nport = 13789\n").unwrap();

        let loaded = FileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded.router.hostname, "hub-a.local");
        assert!(loaded.devices.is_empty());
        assert!(!loaded.room.is_setup());
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{StateStore, StoreError};

/// Stores each key as `<dir>/<key>.json`. The directory is created on the
/// first write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        FileStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, document: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Write-then-rename so a crash mid-write never leaves a torn document.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, document)?;
        fs::rename(&tmp, &path)?;
        debug!("FileStore: wrote {} bytes to {}", document.len(), path.display());
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "prediction-engine-filestore-{}-{}",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn missing_document_reads_as_none() {
        let dir = temp_dir("missing");
        let store = FileStore::new(&dir);
        assert!(store.read("learner-state").unwrap().is_none());
    }

    #[test]
    fn write_creates_directory_and_persists() {
        let dir = temp_dir("write");
        let _ = fs::remove_dir_all(&dir);

        let store = FileStore::new(&dir);
        store.write("learner-state", "{\"samples\":3}").unwrap();

        let reopened = FileStore::new(&dir);
        assert_eq!(
            reopened.read("learner-state").unwrap().as_deref(),
            Some("{\"samples\":3}")
        );
        assert!(dir.join("learner-state.json").exists());

        fs::remove_dir_all(&dir).ok();
    }
}

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Writes `content` to `path` by staging it in a sibling `.tmp` file and
/// renaming over the destination, so a crashed or concurrent process never
/// observes a partial file.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let staging = path.with_extension("tmp");

    {
        let mut file = File::create(&staging)?;
        file.write_all(content)?;
        // A rename is only atomic for data that has already reached disk;
        // the scope also closes the handle, which rename-over needs on
        // Windows.
        file.sync_all()?;
    }

    fs::rename(&staging, path)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn atomic_write_creates_new_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("cache.json");

        atomic_write(&target, b"{\"entries\":{}}").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"{\"entries\":{}}");
    }

    #[test]
    fn atomic_write_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("cache.json");
        fs::write(&target, "old").unwrap();

        atomic_write(&target, b"new").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn atomic_write_leaves_no_staging_file_behind() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("baseline.json");

        atomic_write(&target, b"{}").unwrap();

        assert!(target.exists());
        assert!(!target.with_extension("tmp").exists());
    }
}

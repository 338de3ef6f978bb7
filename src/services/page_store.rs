use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rocket::fs::TempFile;
use tokio::fs;
use tracing::warn;

use crate::models::error::ComicError;

/// Filesystem lifecycle for comic page images.
///
/// Every comic owns one directory directly under the uploads root, named by
/// its sanitized folder name. The store never touches the catalog; keeping
/// the two in agreement is the service layer's job.
pub struct PageStore {
    root: PathBuf,
}

impl PageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PageStore { root: root.into() }
    }

    fn dir(&self, folder: &str) -> PathBuf {
        self.root.join(folder)
    }

    /// Create the comic's directory (and parents) if absent. Idempotent;
    /// fails if the path exists as a non-directory or on permission errors.
    pub async fn ensure_directory(&self, folder: &str) -> Result<(), ComicError> {
        fs::create_dir_all(self.dir(folder)).await?;
        Ok(())
    }

    /// Persist one uploaded file into the comic's directory and return the
    /// generated filename. `stamp` is shared by the whole upload batch;
    /// `seq` is the file's position within it, so names never collide even
    /// inside a single millisecond.
    pub async fn write_page(
        &self,
        folder: &str,
        file: &mut TempFile<'_>,
        stamp: i64,
        seq: usize,
    ) -> Result<String, ComicError> {
        let original = file
            .raw_name()
            .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str());
        let filename = page_filename(stamp, seq, original);
        file.copy_to(self.dir(folder).join(&filename)).await?;
        Ok(filename)
    }

    /// Names of the regular files directly under the comic's directory.
    /// An absent directory is an empty comic, not an error.
    pub async fn list_files(&self, folder: &str) -> Result<Vec<String>, ComicError> {
        let mut entries = match fs::read_dir(self.dir(folder)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.metadata().await?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(files)
    }

    /// Total byte size of the regular files directly under the comic's
    /// directory; 0 if the directory is absent.
    pub async fn total_size(&self, folder: &str) -> Result<u64, ComicError> {
        let mut entries = match fs::read_dir(self.dir(folder)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                total += metadata.len();
            }
        }
        Ok(total)
    }

    /// Names of the per-comic directories under the uploads root. Used by
    /// startup reconciliation to spot directories no record points at.
    pub async fn list_folders(&self) -> Result<Vec<String>, ComicError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut folders = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.metadata().await?.is_dir() {
                folders.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(folders)
    }

    /// Recursively remove the comic's directory. No-op if already gone.
    pub async fn delete_directory(&self, folder: &str) -> Result<(), ComicError> {
        match fs::remove_dir_all(self.dir(folder)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of the named files, then of the directory itself
    /// if that left it empty. Used to undo a partially-stored upload batch;
    /// failures are logged and swallowed so the caller's own error wins.
    pub async fn remove_pages(&self, folder: &str, files: &[String]) {
        let dir = self.dir(folder);
        for file in files {
            if let Err(e) = fs::remove_file(dir.join(file)).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(folder = %folder, file = %file, error = %e, "failed to remove orphaned page");
                }
            }
        }
        // Only succeeds when no other comic's pages are left behind.
        let _ = fs::remove_dir(&dir).await;
    }
}

/// Generated page filename: `<stamp>-<seq><ext>`. The extension is taken
/// from the client-supplied filename only when it is short plain ASCII;
/// anything else is dropped rather than sanitized.
pub fn page_filename(stamp: i64, seq: usize, original_name: Option<&str>) -> String {
    let ext = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{stamp}-{seq}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, PageStore) {
        let tmp = TempDir::new().unwrap();
        let store = PageStore::new(tmp.path().join("uploads"));
        (tmp, store)
    }

    #[test]
    fn filename_keeps_plain_extensions() {
        assert_eq!(page_filename(1700000000000, 0, Some("a.jpg")), "1700000000000-0.jpg");
        assert_eq!(page_filename(1700000000000, 3, Some("b.PNG")), "1700000000000-3.png");
    }

    #[test]
    fn filename_drops_untrusted_extensions() {
        assert_eq!(page_filename(1, 0, None), "1-0");
        assert_eq!(page_filename(1, 0, Some("noext")), "1-0");
        assert_eq!(page_filename(1, 0, Some("x.j<p>g")), "1-0");
        assert_eq!(page_filename(1, 0, Some("x.waytoolongext")), "1-0");
        assert_eq!(page_filename(1, 1, Some("../../etc/passwd.d/x.sh")), "1-1.sh");
    }

    #[test]
    fn filenames_are_unique_within_a_batch() {
        let a = page_filename(42, 0, Some("a.jpg"));
        let b = page_filename(42, 1, Some("a.jpg"));
        assert_ne!(a, b);
    }

    #[rocket::async_test]
    async fn ensure_directory_is_idempotent() {
        let (_tmp, store) = store();
        store.ensure_directory("Comic_A").await.unwrap();
        store.ensure_directory("Comic_A").await.unwrap();
        assert!(store.dir("Comic_A").is_dir());
    }

    #[rocket::async_test]
    async fn listing_an_absent_directory_is_empty() {
        let (_tmp, store) = store();
        assert!(store.list_files("nope").await.unwrap().is_empty());
        assert_eq!(store.total_size("nope").await.unwrap(), 0);
    }

    #[rocket::async_test]
    async fn total_size_sums_files_only() {
        let (_tmp, store) = store();
        store.ensure_directory("A").await.unwrap();
        fs::write(store.dir("A").join("1.jpg"), vec![0u8; 100]).await.unwrap();
        fs::write(store.dir("A").join("2.jpg"), vec![0u8; 50]).await.unwrap();
        fs::create_dir(store.dir("A").join("sub")).await.unwrap();

        assert_eq!(store.total_size("A").await.unwrap(), 150);

        let mut files = store.list_files("A").await.unwrap();
        files.sort();
        assert_eq!(files, vec!["1.jpg", "2.jpg"]);
    }

    #[rocket::async_test]
    async fn delete_directory_is_idempotent() {
        let (_tmp, store) = store();
        store.ensure_directory("A").await.unwrap();
        fs::write(store.dir("A").join("1.jpg"), b"x").await.unwrap();

        store.delete_directory("A").await.unwrap();
        assert!(!store.dir("A").exists());
        store.delete_directory("A").await.unwrap();
    }

    #[rocket::async_test]
    async fn remove_pages_cleans_batch_and_empty_directory() {
        let (_tmp, store) = store();
        store.ensure_directory("A").await.unwrap();
        fs::write(store.dir("A").join("1.jpg"), b"x").await.unwrap();
        fs::write(store.dir("A").join("2.jpg"), b"y").await.unwrap();

        store
            .remove_pages("A", &["1.jpg".to_string(), "2.jpg".to_string()])
            .await;
        assert!(!store.dir("A").exists());
    }

    #[rocket::async_test]
    async fn remove_pages_leaves_other_files_alone() {
        let (_tmp, store) = store();
        store.ensure_directory("A").await.unwrap();
        fs::write(store.dir("A").join("keep.jpg"), b"x").await.unwrap();
        fs::write(store.dir("A").join("drop.jpg"), b"y").await.unwrap();

        store.remove_pages("A", &["drop.jpg".to_string()]).await;
        assert!(store.dir("A").join("keep.jpg").exists());
        assert!(!store.dir("A").join("drop.jpg").exists());
    }
}

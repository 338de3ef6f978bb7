use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::sync::RwLock;
use tracing::debug;

use crate::models::comic::Comic;
use crate::models::error::ComicError;

/// Persisted record set for comics.
///
/// Services depend on this trait, not on a concrete store, and receive the
/// implementation from `main`. First match wins wherever a name can be
/// ambiguous (duplicate names are a configurable allowance, see
/// [`JsonCatalog`]).
#[rocket::async_trait]
pub trait Catalog: Send + Sync {
    /// Add a record. Fails with `Validation` on a blank name, or on a
    /// duplicate name when duplicates are disallowed.
    async fn insert(&self, comic: &Comic) -> Result<(), ComicError>;

    /// Every record, in insertion order.
    async fn find_all(&self) -> Result<Vec<Comic>, ComicError>;

    async fn find_by_name(&self, name: &str) -> Result<Comic, ComicError>;

    /// Point the thumbnail at `pages[page_index]` and return the updated
    /// record. Fails with `Validation` when the index is outside
    /// `[0, pages.len())`.
    async fn update_thumbnail(&self, name: &str, page_index: i64) -> Result<Comic, ComicError>;

    /// Remove a record and return it, so the caller can clean up its folder.
    async fn delete_by_name(&self, name: &str) -> Result<Comic, ComicError>;
}

/// File-backed document catalog: the full record set lives in memory behind
/// an `RwLock` and is written back to one JSON file after every successful
/// mutation. A failed write rolls the in-memory change back, so memory and
/// file never diverge.
pub struct JsonCatalog {
    path: PathBuf,
    allow_duplicate_names: bool,
    comics: RwLock<Vec<Comic>>,
}

impl JsonCatalog {
    /// Load the catalog file, or start empty if it does not exist yet.
    ///
    /// An unreadable or unparsable file is an error, not an empty catalog:
    /// this file is the system of record, and starting empty would orphan
    /// every existing upload directory.
    pub fn load(path: impl Into<PathBuf>, allow_duplicate_names: bool) -> Result<Self, ComicError> {
        let path = path.into();
        let comics: Vec<Comic> = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), comics = comics.len(), "catalog loaded");
        Ok(JsonCatalog {
            path,
            allow_duplicate_names,
            comics: RwLock::new(comics),
        })
    }

    async fn persist(&self, comics: &[Comic]) -> Result<(), ComicError> {
        let json = serde_json::to_string_pretty(comics)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[rocket::async_trait]
impl Catalog for JsonCatalog {
    async fn insert(&self, comic: &Comic) -> Result<(), ComicError> {
        if comic.name.trim().is_empty() {
            return Err(ComicError::validation("Comic name is required"));
        }

        let mut comics = self.comics.write().await;
        if !self.allow_duplicate_names && comics.iter().any(|c| c.name == comic.name) {
            return Err(ComicError::Validation(format!(
                "A comic named \"{}\" already exists",
                comic.name
            )));
        }

        comics.push(comic.clone());
        if let Err(e) = self.persist(&comics).await {
            comics.pop();
            return Err(e);
        }
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Comic>, ComicError> {
        Ok(self.comics.read().await.clone())
    }

    async fn find_by_name(&self, name: &str) -> Result<Comic, ComicError> {
        self.comics
            .read()
            .await
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or(ComicError::NotFound)
    }

    async fn update_thumbnail(&self, name: &str, page_index: i64) -> Result<Comic, ComicError> {
        let mut comics = self.comics.write().await;
        let pos = comics
            .iter()
            .position(|c| c.name == name)
            .ok_or(ComicError::NotFound)?;

        if page_index < 0 || page_index >= comics[pos].pages.len() as i64 {
            return Err(ComicError::validation("Invalid page index"));
        }

        let previous = comics[pos].thumbnail.clone();
        comics[pos].thumbnail = Some(comics[pos].pages[page_index as usize].clone());
        if let Err(e) = self.persist(&comics).await {
            comics[pos].thumbnail = previous;
            return Err(e);
        }
        Ok(comics[pos].clone())
    }

    async fn delete_by_name(&self, name: &str) -> Result<Comic, ComicError> {
        let mut comics = self.comics.write().await;
        let pos = comics
            .iter()
            .position(|c| c.name == name)
            .ok_or(ComicError::NotFound)?;

        let comic = comics.remove(pos);
        if let Err(e) = self.persist(&comics).await {
            comics.insert(pos, comic);
            return Err(e);
        }
        Ok(comic)
    }
}

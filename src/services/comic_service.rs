use std::sync::Arc;

use chrono::Utc;
use rocket::fs::TempFile;
use tracing::{info, warn};

use crate::models::comic::{Comic, ComicDetails, ComicPages, ComicSummary};
use crate::models::error::ComicError;
use crate::services::catalog::Catalog;
use crate::services::page_store::PageStore;
use crate::utils::sanitize::sanitize_name;

/// Orchestrates the catalog and the page store so the two stay in
/// agreement: ingestion writes files before the record and undoes the files
/// when the record fails; deletion removes the record before the files and
/// tolerates a leftover directory.
pub struct ComicService {
    catalog: Arc<dyn Catalog>,
    pages: PageStore,
}

impl ComicService {
    pub fn new(catalog: Arc<dyn Catalog>, pages: PageStore) -> Self {
        ComicService { catalog, pages }
    }

    /// Ingest a new comic: validate the name, store every uploaded file in
    /// input order, then insert the catalog record.
    ///
    /// The two phases are not atomic. A failed file write removes the files
    /// already written in this batch; a failed insert removes the whole
    /// batch (and the directory, if that left it empty) so no orphaned
    /// pages outlive the missing record.
    pub async fn upload(
        &self,
        name: &str,
        mut files: Vec<TempFile<'_>>,
    ) -> Result<Comic, ComicError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ComicError::validation("Comic name is required"));
        }
        let folder = sanitize_name(name);
        if folder.is_empty() {
            return Err(ComicError::validation(
                "Comic name contains no usable characters",
            ));
        }

        self.pages.ensure_directory(&folder).await?;

        let stamp = Utc::now().timestamp_millis();
        let mut stored = Vec::with_capacity(files.len());
        for (seq, file) in files.iter_mut().enumerate() {
            match self.pages.write_page(&folder, file, stamp, seq).await {
                Ok(filename) => stored.push(filename),
                Err(e) => {
                    warn!(comic = name, page = seq, error = %e, "page write failed, undoing batch");
                    self.pages.remove_pages(&folder, &stored).await;
                    return Err(e);
                }
            }
        }

        let comic = Comic::new(name.to_string(), folder, stored);
        if let Err(e) = self.catalog.insert(&comic).await {
            warn!(comic = name, error = %e, "catalog insert failed, removing stored pages");
            self.pages.remove_pages(&comic.folder, &comic.pages).await;
            return Err(e);
        }

        info!(comic = name, pages = comic.pages.len(), "comic uploaded");
        Ok(comic)
    }

    pub async fn list_summaries(&self) -> Result<Vec<ComicSummary>, ComicError> {
        let comics = self.catalog.find_all().await?;
        Ok(comics.iter().map(Comic::summary).collect())
    }

    pub async fn get_comic(&self, name: &str) -> Result<ComicPages, ComicError> {
        Ok(self.catalog.find_by_name(name).await?.page_listing())
    }

    /// Page count from the record, byte size from the directory. A record
    /// whose directory has gone missing reads as zero bytes, not an error.
    pub async fn get_details(&self, name: &str) -> Result<ComicDetails, ComicError> {
        let comic = self.catalog.find_by_name(name).await?;
        let bytes = self.pages.total_size(&comic.folder).await?;
        Ok(ComicDetails {
            name: comic.name,
            page_count: comic.pages.len(),
            total_size: format_size_mb(bytes),
        })
    }

    /// Returns the new thumbnail URL.
    pub async fn set_thumbnail(&self, name: &str, page_index: i64) -> Result<String, ComicError> {
        let comic = self.catalog.update_thumbnail(name, page_index).await?;
        match comic.thumbnail.as_deref() {
            Some(file) => Ok(comic.page_url(file)),
            None => Err(ComicError::validation("Comic has no pages")),
        }
    }

    /// Compare catalog records against the page directories and log every
    /// disagreement: cataloged pages missing from disk, and directories no
    /// record points at (the tolerated leftovers of failed deletions).
    /// Inconsistencies are reported, never repaired.
    pub async fn reconcile(&self) -> Result<(), ComicError> {
        let comics = self.catalog.find_all().await?;

        for comic in &comics {
            let on_disk = self.pages.list_files(&comic.folder).await?;
            for page in &comic.pages {
                if !on_disk.iter().any(|f| f == page) {
                    warn!(comic = %comic.name, page = %page, "cataloged page missing on disk");
                }
            }
        }

        for folder in self.pages.list_folders().await? {
            if !comics.iter().any(|c| c.folder == folder) {
                warn!(folder = %folder, "orphaned upload directory has no catalog record");
            }
        }

        Ok(())
    }

    /// Delete the record first, then the directory. Directory removal is
    /// best-effort: a failure leaves an orphaned directory behind, which is
    /// logged and otherwise tolerated.
    pub async fn delete_comic(&self, name: &str) -> Result<String, ComicError> {
        let comic = self.catalog.delete_by_name(name).await?;
        if let Err(e) = self.pages.delete_directory(&comic.folder).await {
            warn!(comic = %comic.name, folder = %comic.folder, error = %e,
                "record deleted but directory removal failed; orphaned files remain");
        }
        info!(comic = %comic.name, "comic deleted");
        Ok(comic.name)
    }
}

/// Mebibytes with two decimals, e.g. `"1.00 MB"`.
pub fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::JsonCatalog;
    use tempfile::TempDir;

    #[rocket::async_test]
    async fn reconcile_reports_without_failing() {
        let tmp = TempDir::new().unwrap();
        let catalog =
            Arc::new(JsonCatalog::load(tmp.path().join("catalog.json"), false).unwrap());
        let service = ComicService::new(catalog.clone(), PageStore::new(tmp.path().join("uploads")));

        // One record with no files behind it, one directory with no record.
        catalog
            .insert(&Comic::new("Ghost".into(), "Ghost".into(), vec!["1.jpg".into()]))
            .await
            .unwrap();
        std::fs::create_dir_all(tmp.path().join("uploads").join("Orphan")).unwrap();

        service.reconcile().await.unwrap();
    }

    #[test]
    fn size_formatting_matches_the_wire_format() {
        assert_eq!(format_size_mb(0), "0.00 MB");
        assert_eq!(format_size_mb(1_048_576), "1.00 MB");
        assert_eq!(format_size_mb(1_572_864), "1.50 MB");
        assert_eq!(format_size_mb(10_240), "0.01 MB");
    }
}

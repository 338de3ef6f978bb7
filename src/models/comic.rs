use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog record: one named, ordered set of page images.
///
/// `folder` is the sanitized directory name under the uploads root; `pages`
/// holds bare filenames in upload order. `thumbnail`, when set, is always
/// one of `pages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comic {
    pub name: String,
    pub folder: String,
    pub pages: Vec<String>,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Comic {
    pub fn new(name: String, folder: String, pages: Vec<String>) -> Self {
        let thumbnail = pages.first().cloned();
        Comic {
            name,
            folder,
            pages,
            thumbnail,
            created_at: Utc::now(),
        }
    }

    /// Public URL for one of this comic's page files.
    pub fn page_url(&self, filename: &str) -> String {
        format!(
            "/uploads/{}/{}",
            urlencoding::encode(&self.folder),
            urlencoding::encode(filename)
        )
    }

    /// URL of the designated thumbnail, falling back to the first page.
    pub fn thumbnail_url(&self) -> Option<String> {
        self.thumbnail
            .as_deref()
            .or_else(|| self.pages.first().map(String::as_str))
            .map(|file| self.page_url(file))
    }

    pub fn summary(&self) -> ComicSummary {
        ComicSummary {
            name: self.name.clone(),
            thumbnail: self.thumbnail_url(),
            page_count: self.pages.len(),
        }
    }

    pub fn page_listing(&self) -> ComicPages {
        ComicPages {
            name: self.name.clone(),
            pages: self.pages.iter().map(|file| self.page_url(file)).collect(),
        }
    }
}

/// List-view projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicSummary {
    pub name: String,
    pub thumbnail: Option<String>,
    pub page_count: usize,
}

/// Read-view projection: every page as a servable URL.
#[derive(Debug, Serialize)]
pub struct ComicPages {
    pub name: String,
    pub pages: Vec<String>,
}

/// Detail projection with the aggregate on-disk size.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicDetails {
    pub name: String,
    pub page_count: usize,
    pub total_size: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetThumbnailRequest {
    pub page_index: i64,
}

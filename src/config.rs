use std::path::PathBuf;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory for per-comic page folders.
    pub uploads_dir: PathBuf,
    /// JSON document file backing the catalog.
    pub catalog_path: PathBuf,
    /// Permit multiple catalog records with the same name. Off by default:
    /// duplicates share one sanitized folder, so deleting one would take
    /// the other's pages with it.
    pub allow_duplicate_names: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let uploads_dir = std::env::var("UPLOADS_DIR").unwrap_or_else(|_| String::from("uploads"));
        let catalog_path =
            std::env::var("CATALOG_PATH").unwrap_or_else(|_| String::from("catalog.json"));
        let allow_duplicate_names = std::env::var("ALLOW_DUPLICATE_NAMES")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        AppConfig {
            uploads_dir: PathBuf::from(uploads_dir),
            catalog_path: PathBuf::from(catalog_path),
            allow_duplicate_names,
        }
    }
}

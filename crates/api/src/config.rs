use std::path::PathBuf;

use imgsheet_core::config::{SheetConfig, StorageConfig, ThumbnailConfig, DEFAULT_ALLOWED_EXTENSIONS};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`; archive uploads are slow).
    pub request_timeout_secs: u64,
    /// Maximum request body size in bytes (default: 15 GiB).
    pub max_upload_bytes: usize,
    /// Upload tree, results directory and public URL settings.
    pub storage: StorageConfig,
    pub thumbnails: ThumbnailConfig,
    pub sheets: SheetConfig,
}

const DEFAULT_MAX_UPLOAD_BYTES: &str = "16106127360";

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `600`                      |
    /// | `MAX_UPLOAD_BYTES`     | `16106127360` (15 GiB)     |
    /// | `BASE_URL`             | `http://localhost`         |
    /// | `UPLOAD_DIR`           | `uploads`                  |
    /// | `RESULTS_DIR`          | `results`                  |
    /// | `ALLOWED_EXTENSIONS`   | `png,jpg,jpeg,gif,webp`    |
    /// | `THUMBNAIL_SIZE`       | `90`                       |
    /// | `THUMBNAIL_QUALITY`    | `85`                       |
    /// | `LINK_COLUMNS`         | `10`                       |
    /// | `ROW_TEMPLATE_PATH`    | `templates/row.xlsx`       |
    /// | `CELL_TEMPLATE_PATH`   | `templates/cell.xlsx`      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = comma_list("CORS_ORIGINS", "http://localhost:5000");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let storage = StorageConfig {
            upload_root: PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into())),
            results_root: PathBuf::from(std::env::var("RESULTS_DIR").unwrap_or_else(|_| "results".into())),
            base_url: std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost".into()),
            allowed_extensions: comma_list("ALLOWED_EXTENSIONS", &DEFAULT_ALLOWED_EXTENSIONS.join(","))
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        };

        let thumbnails = ThumbnailConfig {
            max_edge: std::env::var("THUMBNAIL_SIZE")
                .unwrap_or_else(|_| "90".into())
                .parse()
                .expect("THUMBNAIL_SIZE must be a valid u32"),
            quality: std::env::var("THUMBNAIL_QUALITY")
                .unwrap_or_else(|_| "85".into())
                .parse()
                .expect("THUMBNAIL_QUALITY must be a valid u8"),
        };

        let sheets = SheetConfig {
            link_columns: std::env::var("LINK_COLUMNS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .expect("LINK_COLUMNS must be a valid usize"),
            row_template: Some(PathBuf::from(
                std::env::var("ROW_TEMPLATE_PATH").unwrap_or_else(|_| "templates/row.xlsx".into()),
            )),
            cell_template: Some(PathBuf::from(
                std::env::var("CELL_TEMPLATE_PATH").unwrap_or_else(|_| "templates/cell.xlsx".into()),
            )),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            storage,
            thumbnails,
            sheets,
        }
    }
}

fn comma_list(var: &str, default: &str) -> Vec<String> {
    std::env::var(var)
        .unwrap_or_else(|_| default.into())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

//! Browsing and pruning the upload tree.
//!
//! The tree is `<upload_root>/<template>/<article>/<file>`. Originals are the
//! files with an allowed extension and no `_thumb` marker; thumbnails sit
//! next to them as `<stem>_thumb.jpg`.

use std::fs;
use std::io;
use std::path::{Component, Path};

use percent_encoding::percent_decode_str;

use crate::config::StorageConfig;
use crate::error::CoreError;
use crate::types::StoredImage;

// ── Constants ─────────────────────────────────────────────────────────

/// Marker that identifies thumbnail files by name.
pub const THUMB_MARKER: &str = "_thumb";

// ── Listing ───────────────────────────────────────────────────────────

/// List every stored original, sorted by (template, article, filename).
///
/// A missing upload root is an empty catalog.
pub fn list_stored_images(storage: &StorageConfig) -> io::Result<Vec<StoredImage>> {
    let mut images = Vec::new();
    if !storage.upload_root.is_dir() {
        tracing::debug!(root = %storage.upload_root.display(), "Upload root missing");
        return Ok(images);
    }

    for template in subdirectories(&storage.upload_root)? {
        let template_path = storage.upload_root.join(&template);
        for article in subdirectories(&template_path)? {
            let article_path = template_path.join(&article);
            for entry in fs::read_dir(&article_path)? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let Ok(filename) = entry.file_name().into_string() else {
                    continue;
                };
                if filename.contains(THUMB_MARKER) || !storage.is_allowed(&filename) {
                    continue;
                }

                let url = storage.image_url(&template, &article, &filename);
                let thumb_name = format!("{}{THUMB_MARKER}.jpg", stem(&filename));
                let thumbnail_url = if article_path.join(&thumb_name).is_file() {
                    storage.image_url(&template, &article, &thumb_name)
                } else {
                    url.clone()
                };

                images.push(StoredImage {
                    url,
                    article: article.clone(),
                    filename,
                    template: template.clone(),
                    thumbnail_url,
                });
            }
        }
    }

    images.sort_by(|a, b| {
        (&a.template, &a.article, &a.filename).cmp(&(&b.template, &b.article, &b.filename))
    });
    Ok(images)
}

// ── Deletion ──────────────────────────────────────────────────────────

/// Delete the image behind `image_url`, its thumbnails, and any folders the
/// deletion leaves empty (never the upload root itself).
///
/// Returns the number of files removed.
pub fn delete_image(storage: &StorageConfig, image_url: &str) -> Result<usize, CoreError> {
    let [template, article, filename] = parse_image_url(storage, image_url)?;

    let article_dir = storage.upload_root.join(&template).join(&article);
    let original = article_dir.join(&filename);
    if !original.is_file() {
        return Err(CoreError::NotFound {
            entity: "Image",
            id: image_url.to_string(),
        });
    }

    fs::remove_file(&original).map_err(|e| internal("remove image", &original, e))?;
    let mut removed = 1;

    for thumb in thumbnail_variants(&filename) {
        let path = article_dir.join(&thumb);
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| internal("remove thumbnail", &path, e))?;
            removed += 1;
        }
    }

    let template_dir = storage.upload_root.join(&template);
    if remove_if_empty(&article_dir)? {
        remove_if_empty(&template_dir)?;
    }

    tracing::info!(url = %image_url, removed, "Deleted image");
    Ok(removed)
}

/// Split an image URL into decoded (template, article, filename) segments.
fn parse_image_url(storage: &StorageConfig, image_url: &str) -> Result<[String; 3], CoreError> {
    let prefix = storage.images_prefix();
    let rest = image_url
        .strip_prefix(&prefix)
        .ok_or_else(|| CoreError::Validation(format!("URL must start with {prefix}")))?;

    let segments: Vec<&str> = rest.split('/').collect();
    let [template, article, filename] = segments.as_slice() else {
        return Err(CoreError::Validation(
            "URL must have the form images/<template>/<article>/<file>".to_string(),
        ));
    };

    let decode = |segment: &str| -> Result<String, CoreError> {
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| CoreError::Validation("URL segment is not valid UTF-8".to_string()))?
            .into_owned();
        if !is_single_component(&decoded) {
            return Err(CoreError::Validation(format!("Invalid path segment: {decoded}")));
        }
        Ok(decoded)
    };

    Ok([decode(template)?, decode(article)?, decode(filename)?])
}

fn is_single_component(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !segment.contains(['/', '\\'])
}

/// Every thumbnail name ever produced for `filename`.
fn thumbnail_variants(filename: &str) -> Vec<String> {
    let stem = stem(filename);
    let mut variants = vec![
        format!("{stem}{THUMB_MARKER}.jpg"),
        format!("{stem}{THUMB_MARKER}.jpeg"),
    ];
    if let Some((_, ext)) = filename.rsplit_once('.') {
        let same_ext = format!("{stem}{THUMB_MARKER}.{ext}");
        if !variants.contains(&same_ext) {
            variants.push(same_ext);
        }
    }
    variants
}

fn stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => &filename[..pos],
        _ => filename,
    }
}

// ── Private helpers ───────────────────────────────────────────────────

/// Sorted names of the directories directly under `dir`.
fn subdirectories(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
    }
    names.sort();
    Ok(names)
}

fn remove_if_empty(dir: &Path) -> Result<bool, CoreError> {
    let is_empty = fs::read_dir(dir)
        .map_err(|e| internal("read directory", dir, e))?
        .next()
        .is_none();
    if is_empty {
        fs::remove_dir(dir).map_err(|e| internal("remove directory", dir, e))?;
        tracing::debug!(dir = %dir.display(), "Pruned empty directory");
    }
    Ok(is_empty)
}

fn internal(action: &str, path: &Path, e: io::Error) -> CoreError {
    CoreError::Internal(format!("Failed to {action} {}: {e}", path.display()))
}

// ── Tests ─────────────────────────────────────────────────────────────

//! Server-rendered HTML: the landing page, the upload form, and the batch
//! and archive views with their export controls.
//!
//! The views list images as `<li class="image">` items carrying their
//! descriptor in `data-*` attributes. A small inline script reads those to
//! call `/admin/download-xlsx`, `/admin/download-links` and
//! `/admin/delete-image`.

use std::collections::BTreeSet;
use std::fmt::Write;

use axum::extract::Query;
use axum::response::Html;
use imgsheet_core::sheet::TemplateKind;
use imgsheet_core::types::{StoredImage, UrlDescriptor};
use serde::Deserialize;

use crate::handlers::results::ResultView;

// ---------------------------------------------------------------------------
// Static pieces
// ---------------------------------------------------------------------------

const LANDING_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Image sheet</title></head>
<body>
  <h1>Image sheet</h1>
  <p>Upload product images and export their links as a spreadsheet.</p>
  <p><a href="/admin">Upload images</a> | <a href="/admin/archive">Stored images</a></p>
</body>
</html>
"#;

const STYLE: &str = r#"<style>
  body { font-family: sans-serif; margin: 2rem; }
  ul.images { list-style: none; padding: 0; }
  li.image { display: flex; gap: 1rem; align-items: center; margin: 0.5rem 0; }
  li.image img { width: 90px; height: 90px; object-fit: contain; }
  .error { color: #b00020; }
  .ok { color: #1b5e20; }
</style>"#;

/// Client side of the export controls. Only visible items are exported.
const EXPORT_SCRIPT: &str = r#"<script>
document.addEventListener('DOMContentLoaded', () => {
  const list = document.getElementById('images');
  const status = document.getElementById('status');
  const templateSelect = document.getElementById('template');
  const separatorRow = document.getElementById('separator-row');
  const separatorSelect = document.getElementById('separator');
  const filter = document.getElementById('template-filter');
  if (!list) return;

  const items = () => Array.from(list.querySelectorAll('li.image')).filter(li => !li.hidden);
  const notify = (message, failed) => {
    status.textContent = message;
    status.className = failed ? 'error' : 'ok';
  };

  const syncSeparator = () => { separatorRow.hidden = templateSelect.value !== 'cell'; };
  templateSelect.addEventListener('change', syncSeparator);
  syncSeparator();

  if (filter) {
    filter.addEventListener('change', () => {
      list.querySelectorAll('li.image').forEach(li => {
        li.hidden = filter.value !== '' && li.dataset.template !== filter.value;
      });
    });
  }

  document.getElementById('download-xlsx').addEventListener('click', async () => {
    const selected = items();
    if (!selected.length) { notify('No images to export', true); return; }
    const response = await fetch('/admin/download-xlsx', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({
        template_name: templateSelect.value,
        separator: separatorSelect.value,
        image_data: selected.map(li => ({
          url: li.dataset.url,
          article: li.dataset.article,
          filename: li.dataset.filename,
          thumbnail_url: li.dataset.thumbnail,
        })),
      }),
    });
    if (!response.ok) {
      const err = await response.json().catch(() => ({}));
      notify(err.error || 'Spreadsheet generation failed', true);
      return;
    }
    const disposition = response.headers.get('Content-Disposition') || '';
    const named = disposition.match(/filename\*=UTF-8''([^;]+)/);
    const link = document.createElement('a');
    link.href = URL.createObjectURL(await response.blob());
    link.download = named ? decodeURIComponent(named[1]) : 'images.xlsx';
    link.click();
    setTimeout(() => URL.revokeObjectURL(link.href), 1000);
    notify('Spreadsheet downloaded');
  });

  document.getElementById('download-links').addEventListener('click', () => {
    const params = new URLSearchParams();
    items().forEach(li => params.append('urls', li.dataset.url));
    if (!params.has('urls')) { notify('No links to download', true); return; }
    window.location.href = '/admin/download-links?' + params.toString();
  });

  list.addEventListener('click', async (event) => {
    const button = event.target.closest('button.delete');
    if (!button || !confirm('Delete this image and its thumbnails?')) return;
    const item = button.closest('li.image');
    button.disabled = true;
    const response = await fetch('/admin/delete-image', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ image_url: item.dataset.url }),
    });
    const result = await response.json().catch(() => ({}));
    if (result.success) {
      item.remove();
      notify('Image deleted');
    } else {
      button.disabled = false;
      notify(result.error || 'Delete failed', true);
    }
  });
});
</script>"#;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /
pub async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

#[derive(Debug, Deserialize)]
pub struct FormParams {
    pub error: Option<String>,
}

/// GET /admin
///
/// Upload form. A failed submission redirects back here with `?error=`.
pub async fn upload_form(Query(params): Query<FormParams>) -> Html<String> {
    Html(form_page(params.error.as_deref()))
}

// ---------------------------------------------------------------------------
// Page builders
// ---------------------------------------------------------------------------

/// The upload form, with `error` shown above it when non-blank.
pub fn form_page(error: Option<&str>) -> String {
    let error = alert(error);
    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Upload images</title>{STYLE}</head>
<body>
  <h1>Upload images</h1>
  {error}
  <h2>Single product</h2>
  <form method="post" action="/admin" enctype="multipart/form-data">
    <label>Product <input type="text" name="product_name" required></label>
    <input type="file" name="images" accept="image/*" multiple>
    <button type="submit">Upload</button>
  </form>
  <h2>ZIP archive</h2>
  <p>One folder per article at the top level of the archive.</p>
  <form method="post" action="/admin" enctype="multipart/form-data">
    <label>Catalog <input type="text" name="catalog"></label>
    <input type="file" name="archive" accept=".zip">
    <button type="submit">Upload archive</button>
  </form>
  <p><a href="/admin/archive">Stored images</a></p>
</body>
</html>
"#
    )
}

/// One uploaded batch with export and delete controls.
pub fn results_page(view: &ResultView) -> String {
    let mut items = String::new();
    for image in &view.image_data {
        push_item(&mut items, image, None);
    }
    let heading = escape_html(&view.product_name);
    let count = view.image_data.len();

    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{heading}</title>{STYLE}</head>
<body>
  <h1>{heading}</h1>
  <p>{count} image(s) uploaded at {timestamp}.</p>
  {controls}
  <p id="status" role="status"></p>
  <ul id="images" class="images">
{items}  </ul>
  <p><a href="/admin">Upload more</a> | <a href="/admin/archive">Stored images</a></p>
  {EXPORT_SCRIPT}
</body>
</html>
"#,
        timestamp = escape_html(&view.timestamp),
        controls = export_controls(),
    )
}

/// Every stored original, filterable by template folder.
pub fn archive_page(images: &[StoredImage]) -> String {
    if images.is_empty() {
        return format!(
            r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Stored images</title>{STYLE}</head>
<body>
  <h1>Stored images</h1>
  <p>No images have been uploaded yet.</p>
  <p><a href="/admin">Upload images</a></p>
</body>
</html>
"#
        );
    }

    let templates: BTreeSet<&str> = images.iter().map(|i| i.template.as_str()).collect();
    let mut filter = String::from(r#"<option value="">All templates</option>"#);
    for template in templates {
        let template = escape_html(template);
        let _ = write!(filter, r#"<option value="{template}">{template}</option>"#);
    }

    let mut items = String::new();
    for image in images {
        let descriptor = UrlDescriptor {
            url: image.url.clone(),
            article: image.article.clone(),
            filename: image.filename.clone(),
            thumbnail_url: image.thumbnail_url.clone(),
        };
        push_item(&mut items, &descriptor, Some(&image.template));
    }

    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Stored images</title>{STYLE}</head>
<body>
  <h1>Stored images</h1>
  <p><label>Show <select id="template-filter">{filter}</select></label></p>
  {controls}
  <p id="status" role="status"></p>
  <ul id="images" class="images">
{items}  </ul>
  <p><a href="/admin">Upload images</a></p>
  {EXPORT_SCRIPT}
</body>
</html>
"#,
        controls = export_controls(),
    )
}

/// Template and separator pickers plus the two download buttons.
fn export_controls() -> String {
    let mut options = String::new();
    for kind in TemplateKind::ALL {
        let _ = write!(
            options,
            r#"<option value="{}">{}</option>"#,
            kind.alias(),
            escape_html(kind.label())
        );
    }
    format!(
        r#"<fieldset>
    <legend>Export</legend>
    <label>Template <select id="template">{options}</select></label>
    <span id="separator-row"><label>Separator <select id="separator">
      <option value="comma">Comma</option>
      <option value="newline">New line</option>
    </select></label></span>
    <button type="button" id="download-xlsx">Download XLSX</button>
    <button type="button" id="download-links">Download links</button>
  </fieldset>"#
    )
}

fn push_item(out: &mut String, image: &UrlDescriptor, template: Option<&str>) {
    let url = escape_html(&image.url);
    let article = escape_html(&image.article);
    let template_attr = template
        .map(|t| format!(r#" data-template="{}""#, escape_html(t)))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        r#"    <li class="image" data-url="{url}" data-article="{article}" data-filename="{filename}" data-thumbnail="{thumbnail}"{template_attr}>
      <img src="{thumbnail}" alt="{article}" loading="lazy">
      <span class="article">{article}</span>
      <a href="{url}" target="_blank" rel="noopener">{url}</a>
      <button type="button" class="delete">Delete</button>
    </li>"#,
        filename = escape_html(&image.filename),
        thumbnail = escape_html(&image.thumbnail_url),
    );
}

fn alert(message: Option<&str>) -> String {
    message
        .filter(|m| !m.trim().is_empty())
        .map(|m| format!(r#"<p class="error" role="alert">{}</p>"#, escape_html(m)))
        .unwrap_or_default()
}

/// Escape text for use inside HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(article: &str, n: u32) -> UrlDescriptor {
        UrlDescriptor {
            url: format!("http://img.test/images/generic/{article}/img{n}.png"),
            article: article.to_string(),
            filename: format!("img{n}.png"),
            thumbnail_url: format!("http://img.test/images/generic/{article}/img{n}_thumb.jpg"),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[tokio::test]
    async fn form_shows_escaped_error() {
        let Html(body) = upload_form(Query(FormParams {
            error: Some("<b>bad</b>".to_string()),
        }))
        .await;
        assert!(body.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(!body.contains("<b>bad</b>"));
    }

    #[tokio::test]
    async fn form_without_error_has_no_alert() {
        let Html(body) = upload_form(Query(FormParams { error: None })).await;
        assert!(!body.contains("role=\"alert\""));
    }

    #[test]
    fn results_page_lists_every_image_with_controls() {
        let view = ResultView {
            id: "0123456789abcdef0123456789abcdef".to_string(),
            product_name: "Red <Shoe>".to_string(),
            timestamp: "2024-05-01T10:00:00".to_string(),
            image_data: vec![descriptor("A1", 1), descriptor("A1", 2)],
        };
        let html = results_page(&view);

        assert!(html.contains("<h1>Red &lt;Shoe&gt;</h1>"));
        assert_eq!(html.matches(r#"<li class="image""#).count(), 2);
        assert!(html.contains(r#"data-url="http://img.test/images/generic/A1/img2.png""#));
        assert!(html.contains(r#"<option value="row">В строку</option>"#));
        assert!(html.contains(r#"<option value="cell">В ячейку</option>"#));
        assert!(html.contains("/admin/download-xlsx"));
        assert!(html.contains("/admin/delete-image"));
    }

    #[test]
    fn archive_page_offers_one_filter_per_template() {
        let stored = |template: &str, article: &str| StoredImage {
            url: format!("http://img.test/images/{template}/{article}/a.png"),
            article: article.to_string(),
            filename: "a.png".to_string(),
            template: template.to_string(),
            thumbnail_url: format!("http://img.test/images/{template}/{article}/a_thumb.jpg"),
        };
        let html = archive_page(&[
            stored("generic", "A1"),
            stored("generic", "A2"),
            stored("Spring", "B1"),
        ]);

        assert_eq!(html.matches(r#"<option value="generic">"#).count(), 1);
        assert_eq!(html.matches(r#"<option value="Spring">"#).count(), 1);
        assert!(html.contains(r#"data-template="Spring""#));
        assert_eq!(html.matches(r#"<li class="image""#).count(), 3);
    }

    #[test]
    fn empty_archive_page_has_no_controls() {
        let html = archive_page(&[]);
        assert!(html.contains("No images have been uploaded yet."));
        assert!(!html.contains("download-xlsx"));
    }
}

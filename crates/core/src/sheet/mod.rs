//! Spreadsheet generation.
//!
//! Descriptors are grouped by article (first appearance decides row order)
//! and written one row per article under a header row. The header comes
//! from the layout's on-disk template when one exists, otherwise it is
//! generated.

pub mod layout;
pub mod template;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rust_xlsxwriter::{ColNum, Format, FormatAlign, RowNum, Workbook, XlsxError};

pub use layout::{Layout, Separator, TemplateKind};
pub use template::TemplateError;

use crate::config::SheetConfig;
use crate::types::UrlDescriptor;

/// First data row, 1-based. Everything above it is header.
pub const DATA_START_ROW: u32 = 2;

pub const SHEET_NAME: &str = "Images";

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Error generating XLSX: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Error generating XLSX: template {path}: {source}")]
    Template {
        path: String,
        #[source]
        source: TemplateError,
    },

    #[error("Error generating XLSX: too many columns ({0})")]
    ColumnOverflow(usize),
}

/// Builds a workbook for one layout.
#[derive(Debug, Clone)]
pub struct SheetGenerator {
    layout: Layout,
    template: Option<PathBuf>,
}

impl SheetGenerator {
    pub fn new(layout: Layout, template: Option<PathBuf>) -> Self {
        Self { layout, template }
    }

    /// The one place a template label turns into a layout.
    pub fn for_template(kind: TemplateKind, separator: Separator, config: &SheetConfig) -> Self {
        match kind {
            TemplateKind::Row => Self::new(
                Layout::LinkPerColumn {
                    columns: config.link_columns,
                },
                config.row_template.clone(),
            ),
            TemplateKind::Cell => {
                Self::new(Layout::DelimitedCell(separator), config.cell_template.clone())
            }
        }
    }

    /// Render `records` to `.xlsx` bytes.
    pub fn generate(&self, records: &[UrlDescriptor]) -> Result<Vec<u8>, GenerationError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold().set_align(FormatAlign::Center);
        let wrap_format = Format::new().set_text_wrap();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (row_idx, header) in self.header_rows()?.iter().enumerate() {
            for (col_idx, value) in header.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                worksheet.write_string_with_format(
                    row_idx as RowNum,
                    column(col_idx)?,
                    value,
                    &header_format,
                )?;
            }
        }

        let groups = group_by_article(records);
        for (offset, (article, urls)) in groups.iter().enumerate() {
            let row = (DATA_START_ROW - 1) as RowNum + offset as RowNum;
            for (col_idx, value) in self.layout.row(article, urls).iter().enumerate() {
                if value.is_empty() && col_idx > 0 {
                    continue;
                }
                let col = column(col_idx)?;
                if col_idx > 0 && self.layout.wraps_links() {
                    worksheet.write_string_with_format(row, col, value, &wrap_format)?;
                } else {
                    worksheet.write_string(row, col, value)?;
                }
            }
        }

        for (col_idx, width) in self.layout.column_widths().into_iter().enumerate() {
            worksheet.set_column_width(column(col_idx)?, width)?;
        }

        let bytes = workbook.save_to_buffer()?;
        tracing::debug!(
            layout = ?self.layout,
            articles = groups.len(),
            bytes = bytes.len(),
            "Spreadsheet generated"
        );
        Ok(bytes)
    }

    /// Template header rows when the template file exists, else the
    /// layout's generated header.
    fn header_rows(&self) -> Result<Vec<Vec<String>>, GenerationError> {
        match self.template.as_deref() {
            Some(path) if path.is_file() => read_template_header(path),
            _ => Ok(vec![self.layout.headers()]),
        }
    }
}

fn read_template_header(path: &Path) -> Result<Vec<Vec<String>>, GenerationError> {
    let template_err = |source| GenerationError::Template {
        path: path.display().to_string(),
        source,
    };
    let bytes = std::fs::read(path).map_err(|e| template_err(TemplateError::Io(e)))?;
    let rows = template::read_rows(&bytes, DATA_START_ROW - 1).map_err(template_err)?;
    tracing::debug!(template = %path.display(), rows = rows.len(), "Loaded sheet template");
    Ok(rows)
}

/// Group URLs by article, preserving first-appearance order of articles and
/// encounter order of URLs within each.
pub fn group_by_article(records: &[UrlDescriptor]) -> IndexMap<&str, Vec<&str>> {
    let mut groups: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for record in records {
        groups
            .entry(record.article.as_str())
            .or_default()
            .push(record.url.as_str());
    }
    groups
}

fn column(idx: usize) -> Result<ColNum, GenerationError> {
    ColNum::try_from(idx).map_err(|_| GenerationError::ColumnOverflow(idx))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::{Cursor, Read};

    use assert_matches::assert_matches;
    use quick_xml::events::{BytesStart, Event};

    use super::*;

    fn descriptor(article: &str, n: u32) -> UrlDescriptor {
        UrlDescriptor {
            url: format!("http://x/images/t/{article}/img{n}.png"),
            article: article.to_string(),
            filename: format!("img{n}.png"),
            thumbnail_url: format!("http://x/images/t/{article}/img{n}_thumb.jpg"),
        }
    }

    fn read_back(bytes: &[u8]) -> Vec<Vec<String>> {
        template::read_rows(bytes, u32::MAX).unwrap()
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
        e.attributes()
            .flatten()
            .find(|a| a.key.as_ref() == key)
            .and_then(|a| String::from_utf8(a.value.into_owned()).ok())
    }

    /// One flag per `cellXfs` entry: does that style wrap text.
    fn wrapping_styles(styles_xml: &str) -> Vec<bool> {
        let mut reader = quick_xml::Reader::from_str(styles_xml);
        let mut in_cell_xfs = false;
        let mut wraps = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = true,
                Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Event::Start(e) | Event::Empty(e) if in_cell_xfs => match e.local_name().as_ref() {
                    b"xf" => wraps.push(false),
                    b"alignment" => {
                        let wrap = attr_value(&e, b"wrapText");
                        if matches!(wrap.as_deref(), Some("1" | "true")) {
                            if let Some(last) = wraps.last_mut() {
                                *last = true;
                            }
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        wraps
    }

    /// Cell reference -> style index (`s`, default 0).
    fn cell_styles(sheet_xml: &str) -> HashMap<String, usize> {
        let mut reader = quick_xml::Reader::from_str(sheet_xml);
        let mut styles = HashMap::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                    let reference = attr_value(&e, b"r").unwrap();
                    let style = attr_value(&e, b"s").map_or(0, |s| s.parse().unwrap());
                    styles.insert(reference, style);
                }
                Event::Eof => break,
                _ => {}
            }
        }
        styles
    }

    fn link_cells_wrap(bytes: &[u8]) -> Vec<bool> {
        let wraps = wrapping_styles(&part(bytes, "xl/styles.xml"));
        let styles = cell_styles(&part(bytes, "xl/worksheets/sheet1.xml"));
        ["B2", "B3"]
            .iter()
            .map(|cell| wraps.get(styles[*cell]).copied().unwrap_or(false))
            .collect()
    }

    fn sample() -> Vec<UrlDescriptor> {
        vec![
            descriptor("A2", 1),
            descriptor("A1", 2),
            descriptor("A2", 3),
            descriptor("A1", 4),
        ]
    }

    #[test]
    fn delimited_cell_has_one_row_per_article() {
        let generator = SheetGenerator::new(Layout::DelimitedCell(Separator::Comma), None);
        let rows = read_back(&generator.generate(&sample()).unwrap());

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ["Article", "Image Links"]);
        assert_eq!(rows[1][0], "A2");
        assert_eq!(rows[2][0], "A1");
        assert_eq!(
            rows[2][1],
            "http://x/images/t/A1/img2.png,http://x/images/t/A1/img4.png"
        );
    }

    #[test]
    fn newline_separator_joins_with_line_breaks() {
        let generator = SheetGenerator::new(Layout::DelimitedCell(Separator::Newline), None);
        let rows = read_back(&generator.generate(&sample()).unwrap());
        assert_eq!(
            rows[1][1],
            "http://x/images/t/A2/img1.png\nhttp://x/images/t/A2/img3.png"
        );
    }

    #[test]
    fn newline_links_are_wrapped() {
        let bytes = SheetGenerator::new(Layout::DelimitedCell(Separator::Newline), None)
            .generate(&sample())
            .unwrap();
        assert_eq!(link_cells_wrap(&bytes), [true, true]);
    }

    #[test]
    fn comma_links_are_not_wrapped() {
        let bytes = SheetGenerator::new(Layout::DelimitedCell(Separator::Comma), None)
            .generate(&sample())
            .unwrap();
        assert_eq!(link_cells_wrap(&bytes), [false, false]);
    }

    #[test]
    fn per_column_layout_spreads_links() {
        let generator = SheetGenerator::for_template(
            TemplateKind::Row,
            Separator::Comma,
            &SheetConfig::default(),
        );
        let rows = read_back(&generator.generate(&sample()).unwrap());

        assert_eq!(rows[0].len(), 11);
        assert_eq!(rows[0][10], "Link 10");
        assert_eq!(
            rows[1],
            ["A2", "http://x/images/t/A2/img1.png", "http://x/images/t/A2/img3.png"]
        );
    }

    #[test]
    fn empty_input_yields_header_only() {
        let generator = SheetGenerator::new(Layout::DelimitedCell(Separator::Comma), None);
        let rows = read_back(&generator.generate(&[]).unwrap());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn template_header_replaces_generated_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cell.xlsx");

        let mut wb = Workbook::new();
        let ws = wb.add_worksheet();
        ws.write_string(0, 0, "SKU").unwrap();
        ws.write_string(0, 1, "Photos").unwrap();
        ws.write_string(3, 0, "ignored body").unwrap();
        wb.save(&path).unwrap();

        let generator = SheetGenerator::new(Layout::DelimitedCell(Separator::Comma), Some(path));
        let rows = read_back(&generator.generate(&sample()).unwrap());

        assert_eq!(rows[0], ["SKU", "Photos"]);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn missing_template_falls_back_to_generated_header() {
        let dir = tempfile::tempdir().unwrap();
        let generator = SheetGenerator::new(
            Layout::DelimitedCell(Separator::Comma),
            Some(dir.path().join("absent.xlsx")),
        );
        let rows = read_back(&generator.generate(&sample()).unwrap());
        assert_eq!(rows[0], ["Article", "Image Links"]);
    }

    #[test]
    fn unreadable_template_is_a_generation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a workbook").unwrap();

        let generator = SheetGenerator::new(Layout::DelimitedCell(Separator::Comma), Some(path));
        let err = generator.generate(&sample()).unwrap_err();
        assert_matches!(err, GenerationError::Template { .. });
        assert!(err.to_string().starts_with("Error generating XLSX"));
    }

    #[test]
    fn input_is_not_mutated() {
        let records = sample();
        let before = records.clone();
        SheetGenerator::new(Layout::LinkPerColumn { columns: 2 }, None)
            .generate(&records)
            .unwrap();
        assert_eq!(records, before);
    }

    #[test]
    fn grouping_keeps_first_appearance_order() {
        let records = sample();
        let groups = group_by_article(&records);
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, ["A2", "A1"]);
        assert_eq!(groups["A1"].len(), 2);
    }

    #[test]
    fn output_is_an_xlsx_package() {
        let bytes = SheetGenerator::new(Layout::DelimitedCell(Separator::Comma), None)
            .generate(&sample())
            .unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}

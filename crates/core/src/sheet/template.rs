//! Minimal `.xlsx` reader: the text of the first worksheet, row by row.
//!
//! Used to lift header rows out of on-disk templates. Only string and
//! literal values are read; styles, formulas and merged cells are ignored.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;

/// Upper bound on a single XML part read from a package.
const MAX_XML_PART_BYTES: u64 = 32 * 1024 * 1024;

/// Columns in a worksheet (`A`..=`XFD`).
const MAX_COLUMNS: usize = 16_384;

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("not an xlsx package: {0}")]
    Package(#[from] zip::result::ZipError),

    #[error("package has no worksheet")]
    NoWorksheet,

    #[error("part {0} exceeds size limit")]
    PartTooLarge(String),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read up to `max_rows` rows (1-based, from the top) of the first worksheet.
///
/// Missing rows come back empty; each row is dense up to its last
/// non-empty cell.
pub fn read_rows(bytes: &[u8], max_rows: u32) -> Result<Vec<Vec<String>>, TemplateError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let shared = if archive.index_for_name(SHARED_STRINGS_PART).is_some() {
        read_shared_strings(&read_part(&mut archive, SHARED_STRINGS_PART)?)?
    } else {
        Vec::new()
    };

    let sheet_name = first_worksheet(&archive).ok_or(TemplateError::NoWorksheet)?;
    let sheet_xml = read_part(&mut archive, &sheet_name)?;
    read_sheet(&sheet_xml, &shared, max_rows)
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Vec<u8>, TemplateError> {
    let entry = archive.by_name(name)?;
    let mut out = Vec::new();
    entry.take(MAX_XML_PART_BYTES).read_to_end(&mut out)?;
    if out.len() as u64 >= MAX_XML_PART_BYTES {
        return Err(TemplateError::PartTooLarge(name.to_string()));
    }
    Ok(out)
}

fn first_worksheet(archive: &ZipArchive<Cursor<&[u8]>>) -> Option<String> {
    archive
        .file_names()
        .filter(|n| n.starts_with(WORKSHEET_PREFIX) && n.ends_with(".xml"))
        .min_by_key(|name| {
            name.trim_start_matches(WORKSHEET_PREFIX)
                .trim_end_matches(".xml")
                .parse::<u32>()
                .unwrap_or(u32::MAX)
        })
        .map(str::to_string)
}

/// Each `<si>` becomes one string; rich-text runs are concatenated.
fn read_shared_strings(xml: &[u8]) -> Result<Vec<String>, TemplateError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_t = true,
                _ => {}
            },
            Event::Text(te) if in_t => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&te.unescape().unwrap_or_default());
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"t" => in_t = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

#[derive(Clone, Copy, PartialEq)]
enum CellKind {
    Shared,
    Inline,
    Literal,
}

fn read_sheet(xml: &[u8], shared: &[String], max_rows: u32) -> Result<Vec<Vec<String>>, TemplateError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();

    let mut row_num = 0u32;
    let mut next_col = 0usize;
    let mut cell: Option<(usize, CellKind)> = None;
    let mut text = String::new();
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row_num = attr(&e, b"r")
                        .and_then(|r| r.parse().ok())
                        .unwrap_or(row_num.saturating_add(1));
                    next_col = 0;
                    if row_num > max_rows {
                        break;
                    }
                }
                b"c" => {
                    let col = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_col);
                    let kind = match attr(&e, b"t").as_deref() {
                        Some("s") => CellKind::Shared,
                        Some("inlineStr") => CellKind::Inline,
                        _ => CellKind::Literal,
                    };
                    cell = Some((col, kind));
                    next_col = col + 1;
                    text.clear();
                }
                b"v" => in_value = true,
                b"t" if matches!(cell, Some((_, CellKind::Inline))) => in_value = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                row_num = attr(&e, b"r")
                    .and_then(|r| r.parse().ok())
                    .unwrap_or(row_num.saturating_add(1));
                if row_num > max_rows {
                    break;
                }
            }
            Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                next_col = attr(&e, b"r")
                    .and_then(|r| column_index(&r))
                    .map_or(next_col + 1, |c| c + 1);
            }
            Event::Text(te) if in_value => text.push_str(&te.unescape().unwrap_or_default()),
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some((col, kind)) = cell.take() {
                        let value = match kind {
                            CellKind::Shared => text
                                .trim()
                                .parse::<usize>()
                                .ok()
                                .and_then(|i| shared.get(i).cloned())
                                .unwrap_or_default(),
                            CellKind::Inline | CellKind::Literal => std::mem::take(&mut text),
                        };
                        if !value.is_empty() && row_num >= 1 {
                            put(&mut rows, row_num, col, value);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn put(rows: &mut Vec<Vec<String>>, row_num: u32, col: usize, value: String) {
    let row_idx = row_num as usize - 1;
    if rows.len() <= row_idx {
        rows.resize_with(row_idx + 1, Vec::new);
    }
    let row = &mut rows[row_idx];
    if row.len() <= col {
        row.resize_with(col + 1, String::new);
    }
    row[col] = value;
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| String::from_utf8(a.value.into_owned()).ok())
}

/// Zero-based column of an `A1`-style reference (`"C7"` -> 2).
///
/// `None` past column `XFD`, the last one a worksheet can hold.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let number = letters.iter().try_fold(0usize, |acc, b| {
        acc.checked_mul(26)?
            .checked_add(usize::from(b.to_ascii_uppercase() - b'A' + 1))
    })?;
    (number <= MAX_COLUMNS).then_some(number - 1)
}

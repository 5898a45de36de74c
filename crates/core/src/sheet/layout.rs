//! The two fixed row layouts and the labels that select them.

use crate::error::CoreError;

/// Join character(s) for the delimited-cell layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Separator {
    #[default]
    Comma,
    Newline,
}

impl Separator {
    /// Parse the wire value; `None` means the default (comma).
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value.map(str::trim) {
            None | Some("") | Some("comma") => Ok(Self::Comma),
            Some("newline") => Ok(Self::Newline),
            Some(other) => Err(CoreError::Validation(format!("Invalid separator: {other}"))),
        }
    }

    pub fn delimiter(self) -> &'static str {
        match self {
            Self::Comma => ",",
            Self::Newline => "\n",
        }
    }
}

/// User-facing template label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// "В строку": one link per column.
    Row,
    /// "В ячейку": all links in one delimited cell.
    Cell,
}

impl TemplateKind {
    pub const ROW_LABEL: &'static str = "В строку";
    pub const CELL_LABEL: &'static str = "В ячейку";

    pub const ALL: [TemplateKind; 2] = [TemplateKind::Row, TemplateKind::Cell];

    /// Accepts the display labels and the ASCII aliases `row` / `cell`.
    pub fn parse(label: &str) -> Result<Self, CoreError> {
        match label.trim() {
            l if l == Self::ROW_LABEL || l == Self::Row.alias() => Ok(Self::Row),
            l if l == Self::CELL_LABEL || l == Self::Cell.alias() => Ok(Self::Cell),
            other => Err(CoreError::Validation(format!("Invalid template: {other}"))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Row => Self::ROW_LABEL,
            Self::Cell => Self::CELL_LABEL,
        }
    }

    /// ASCII alias accepted by [`TemplateKind::parse`].
    pub fn alias(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Cell => "cell",
        }
    }
}

/// Column widths, in Excel character units.
const ARTICLE_WIDTH: f64 = 20.0;
const LINK_COLUMN_WIDTH: f64 = 40.0;
const COMMA_CELL_WIDTH: f64 = 100.0;
const NEWLINE_CELL_WIDTH: f64 = 60.0;

/// How one article's URLs are laid out in its row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    /// `Article | Link 1 | ... | Link N`.
    LinkPerColumn { columns: usize },
    /// `Article | Image Links`, links joined by the separator.
    DelimitedCell(Separator),
}

impl Layout {
    pub fn headers(&self) -> Vec<String> {
        match self {
            Self::LinkPerColumn { columns } => std::iter::once("Article".to_string())
                .chain((1..=*columns).map(|i| format!("Link {i}")))
                .collect(),
            Self::DelimitedCell(_) => vec!["Article".to_string(), "Image Links".to_string()],
        }
    }

    /// Cells of one data row, starting with the article. Blank padding is
    /// implied by the header width and not materialized.
    ///
    /// In the per-column layout links past the last header column are still
    /// written, so no URL is dropped.
    pub fn row(&self, article: &str, urls: &[&str]) -> Vec<String> {
        let mut cells = vec![article.to_string()];
        match self {
            Self::LinkPerColumn { .. } => cells.extend(urls.iter().map(|u| u.to_string())),
            Self::DelimitedCell(sep) => cells.push(urls.join(sep.delimiter())),
        }
        cells
    }

    pub fn column_widths(&self) -> Vec<f64> {
        match self {
            Self::LinkPerColumn { columns } => std::iter::once(ARTICLE_WIDTH)
                .chain(std::iter::repeat(LINK_COLUMN_WIDTH).take(*columns))
                .collect(),
            Self::DelimitedCell(Separator::Comma) => vec![ARTICLE_WIDTH, COMMA_CELL_WIDTH],
            Self::DelimitedCell(Separator::Newline) => vec![ARTICLE_WIDTH, NEWLINE_CELL_WIDTH],
        }
    }

    /// Link cells need wrapping so newline-joined links stay visible.
    pub fn wraps_links(&self) -> bool {
        matches!(self, Self::DelimitedCell(Separator::Newline))
    }
}

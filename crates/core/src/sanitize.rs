//! Folder-name sanitizer.
//!
//! Turns arbitrary user input into a single filesystem-safe path component.
//! The mapping is not injective: `"Red Shoe"` and `"Red-Shoe"` share a folder.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Returned for empty input or input that sanitizes to nothing.
pub const UNNAMED: &str = "unnamed";

/// Maximum length of a sanitized name, in characters.
pub const MAX_NAME_CHARS: usize = 255;

/// Most filesystems also cap a path component at 255 bytes.
const MAX_NAME_BYTES: usize = 255;

/// Anything that is not a letter, digit, underscore, whitespace or hyphen.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}_\s-]").expect("valid regex"));

/// Runs of hyphens and whitespace.
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Convert `name` into a safe folder name.
///
/// NFKD-normalizes, drops everything except letters, digits, `_`, `-` and
/// whitespace, collapses separator runs into one `-`, trims `-`/`_` from both
/// ends and caps the result at [`MAX_NAME_CHARS`] characters and 255 UTF-8
/// bytes.
///
/// ```
/// use imgsheet_core::sanitize::safe_folder_name;
///
/// assert_eq!(safe_folder_name("Red  Shoe / 42"), "Red-Shoe-42");
/// assert_eq!(safe_folder_name("***"), "unnamed");
/// ```
pub fn safe_folder_name(name: &str) -> String {
    let normalized: String = name.nfkd().collect();
    let kept = DISALLOWED.replace_all(&normalized, "");
    let collapsed = SEPARATOR_RUN.replace_all(&kept, "-");
    let trimmed = trim_separators(&collapsed);

    let capped = cap(trimmed);
    let capped = trim_separators(capped);

    if capped.is_empty() {
        UNNAMED.to_string()
    } else {
        capped.to_string()
    }
}

/// Longest prefix within both length limits, cut on a char boundary.
fn cap(s: &str) -> &str {
    let end = s
        .char_indices()
        .take(MAX_NAME_CHARS)
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= MAX_NAME_BYTES)
        .last()
        .unwrap_or(0);
    &s[..end]
}

fn trim_separators(s: &str) -> &str {
    s.trim_matches(|c| c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_unnamed() {
        assert_eq!(safe_folder_name(""), UNNAMED);
        assert_eq!(safe_folder_name("   "), UNNAMED);
        assert_eq!(safe_folder_name("-_-"), UNNAMED);
    }

    #[test]
    fn strips_path_and_punctuation() {
        let out = safe_folder_name("a/b:c");
        assert!(!out.contains('/'));
        assert!(!out.contains(':'));
        assert_eq!(out, "abc");
    }

    #[test]
    fn collapses_separators() {
        assert_eq!(safe_folder_name("  red -- shoe\tx "), "red-shoe-x");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(safe_folder_name("В строку"), "В-строку");
    }

    #[test]
    fn drops_combining_marks() {
        // "é" decomposes to "e" + U+0301, and the mark is not a letter.
        assert_eq!(safe_folder_name("café"), "cafe");
    }

    #[test]
    fn caps_length_and_retrims() {
        let long = format!("{}-tail", "a".repeat(254));
        let out = safe_folder_name(&long);
        assert_eq!(out.chars().count(), 254);
        assert!(!out.ends_with('-'));

        let longer = "x".repeat(1000);
        assert_eq!(safe_folder_name(&longer).chars().count(), MAX_NAME_CHARS);
    }

    #[test]
    fn caps_multibyte_names_by_bytes() {
        let out = safe_folder_name(&"ж".repeat(200));
        assert_eq!(out.len(), 254);
        assert_eq!(out.chars().count(), 127);
    }

    #[test]
    fn is_idempotent() {
        for input in [
            "",
            "a/b:c",
            "  Hello,   World! ",
            "В ячейку",
            "café au lait",
            "½ price",
            "__init__",
            &format!("{}  x", "y".repeat(300)),
        ] {
            let once = safe_folder_name(input);
            assert_eq!(safe_folder_name(&once), once, "input: {input:?}");
        }
    }
}

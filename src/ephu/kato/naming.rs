//! Column and application naming helpers shared by extraction and rendering.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Sort key assigned to labels that carry no number.
pub const UNNUMBERED: u32 = 9999;

/// Cell values treated as empty when deciding whether a row carries data.
pub const PLACEHOLDER_TOKENS: [&str; 3] = ["filt", "nan", "none"];

static APP_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})").expect("application number pattern"));

/// Makes column names unique by suffixing repeats with `_1`, `_2`, ...
///
/// Names are trimmed first, so `" A"` and `"A"` collide.
pub fn make_unique_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(columns.len());

    for column in columns {
        let column = column.as_ref().trim().to_string();
        match seen.get_mut(&column) {
            Some(count) => {
                *count += 1;
                unique.push(format!("{column}_{count}"));
            }
            None => {
                seen.insert(column.clone(), 0);
                unique.push(column);
            }
        }
    }

    unique
}

/// Joins the labels of a multi-row header into a single column name.
pub fn combine_column<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|part| part.as_ref().trim())
        .filter(|part| {
            !part.is_empty() && !part.eq_ignore_ascii_case("nan") && !part.contains("Unnamed")
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Extracts the first one- or two-digit number from a label or file name.
pub fn extract_app_number(name: &str) -> u32 {
    APP_NUMBER
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|number| number.as_str().parse().ok())
        .unwrap_or(UNNUMBERED)
}

/// Builds the application label for a source file name.
pub fn application_label(file_name: &str) -> String {
    format!("Приложение-{}", extract_app_number(file_name))
}

/// Returns `true` when the cell is empty or a placeholder token.
pub fn is_placeholder(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty()
        || PLACEHOLDER_TOKENS
            .iter()
            .any(|token| cell.eq_ignore_ascii_case(token))
}

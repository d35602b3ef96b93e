use std::collections::HashSet;

use crate::ephu::kato::model::{CodeEntry, Contribution, Table};
use crate::ephu::kato::naming::extract_app_number;

/// Longest sheet name Excel accepts, in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Padding added to the longest value when sizing a column.
const WIDTH_PADDING: usize = 2;

/// A table preceded by its title and application banners.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub title: String,
    pub application: String,
    pub table: Table,
}

impl Block {
    /// Rows occupied on the sheet: two banners, the header, then the data.
    pub fn height(&self) -> u32 {
        3 + self.table.rows.len() as u32
    }
}

/// One application's sheet with its blocks stacked top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub sheet_name: String,
    pub blocks: Vec<Block>,
    pub column_widths: Vec<f64>,
}

/// Represents all sheets of one code's output workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub sheets: Vec<SheetLayout>,
}

/// Lays out the workbook for one code: a sheet per application, ordered by
/// the application number, with labels lacking a number placed last.
pub fn build_workbook(entry: &CodeEntry, max_width: usize) -> WorkbookData {
    let mut applications: Vec<(&str, &[Contribution])> = entry.applications().collect();
    applications.sort_by_key(|(label, _)| extract_app_number(label));

    let mut sheet_names = SheetNameRegistry::default();
    let sheets = applications
        .into_iter()
        .map(|(label, contributions)| {
            let blocks: Vec<Block> = contributions
                .iter()
                .map(|contribution| Block {
                    title: contribution.title.clone(),
                    application: label.to_string(),
                    table: contribution.table.clone(),
                })
                .collect();
            let column_widths = column_widths(&blocks, max_width);
            SheetLayout {
                sheet_name: sheet_names.assign(label),
                blocks,
                column_widths,
            }
        })
        .collect();

    WorkbookData { sheets }
}

/// Sizes each column to its longest value plus padding, capped at `max_width`.
/// Banner text sits in the first column and counts towards its width.
pub fn column_widths(blocks: &[Block], max_width: usize) -> Vec<f64> {
    let width = blocks.iter().map(|block| block.table.width()).max().unwrap_or(0);
    let mut longest = vec![0usize; width.max(1)];

    for block in blocks {
        longest[0] = longest[0]
            .max(char_len(&block.title))
            .max(char_len(&block.application));
        for (col, name) in block.table.columns.iter().enumerate() {
            longest[col] = longest[col].max(char_len(name));
        }
        for row in &block.table.rows {
            for (col, cell) in row.iter().enumerate() {
                longest[col] = longest[col].max(char_len(cell));
            }
        }
    }

    longest
        .into_iter()
        .map(|len| (len + WIDTH_PADDING).min(max_width) as f64)
        .collect()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

#[derive(Debug, Default)]
struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut counter = 1;
        loop {
            let suffix = format!("_{counter}");
            let prefix: String = base
                .chars()
                .take(MAX_SHEET_NAME_LEN - suffix.chars().count())
                .collect();
            let candidate = format!("{prefix}{suffix}");
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Replaces characters Excel rejects in sheet names and truncates to
/// [`MAX_SHEET_NAME_LEN`] characters.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return "Sheet".to_string();
    }

    sanitized.chars().take(MAX_SHEET_NAME_LEN).collect()
}

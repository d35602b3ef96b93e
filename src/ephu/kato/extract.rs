//! Heuristic table extraction from loosely structured report workbooks.
//!
//! Source reports put a free-form title block above the table. Extraction looks
//! for a header row naming the KATO column within the first rows of the sheet;
//! when there is none the sheet is read as a three-row merged header instead.

use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::ephu::kato::error::{KatoError, Result};
use crate::ephu::kato::io::excel_read::{self, Grid};
use crate::ephu::kato::model::{CodeRoot, ContributionKey, KatoData, Table};
use crate::ephu::kato::naming::{
    application_label, combine_column, is_placeholder, make_unique_columns,
};

/// Number of leading characters of a KATO code forming the area root.
pub const CODE_ROOT_LEN: usize = 6;

/// Latin marker of the KATO column.
const LATIN_MARKER: &str = "kato";
/// Cyrillic marker of the KATO column, matched case-sensitively so words
/// such as `Индикатор` do not qualify.
const CYRILLIC_MARKER: &str = "КАТО";
/// Markers identifying a single header row. A plain Cyrillic `КАТО` is left
/// out: reports labelled that way use the three-row header layout.
const HEADER_MARKERS: [&str; 2] = [LATIN_MARKER, "кaто"];

/// Spreadsheet rows holding the levels of the fallback header.
const MULTI_HEADER_ROWS: [usize; 3] = [1, 2, 3];

static APPLICATION_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})[- ]*(қосымша|kosymsha|приложение)").expect("application row pattern")
});

/// Everything one source file contributes to the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExtract {
    /// Base name of the source file, part of the deduplication key.
    pub source: String,
    pub application: String,
    pub title: String,
    /// Rows grouped by code root, in ascending root order.
    pub groups: Vec<(CodeRoot, Table)>,
}

impl FileExtract {
    /// Adds the groups to the aggregate and returns how many were new.
    pub fn record_into(self, data: &mut KatoData) -> usize {
        let mut added = 0;
        for (code, table) in self.groups {
            let key = ContributionKey::new(code, self.application.clone(), self.source.clone());
            if data.insert(key, self.title.clone(), table) {
                added += 1;
            }
        }
        added
    }
}

/// Reads a workbook and splits its table into code-root groups.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn extract_file(path: &Path, preview_rows: usize) -> Result<FileExtract> {
    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let grid = excel_read::read_first_sheet(path)?;
    extract_grid(&grid, &source, preview_rows)
}

/// Splits an already loaded sheet into code-root groups.
pub fn extract_grid(grid: &Grid, source: &str, preview_rows: usize) -> Result<FileExtract> {
    let application = application_label(source);
    let (app_idx, header_idx) = locate_rows(grid, preview_rows);
    debug!(?app_idx, ?header_idx, "located header rows");

    let (title, table) = match header_idx {
        Some(header_idx) => {
            let title = match app_idx {
                Some(app_idx) if app_idx + 1 < header_idx => join_non_empty(&grid[app_idx + 1]),
                _ => application.clone(),
            };
            (title, single_header_table(grid, header_idx))
        }
        None => {
            warn!(source, "no KATO header row found, reading multi-level header");
            let title = grid
                .first()
                .and_then(|row| row.first())
                .map(|cell| cell.trim().to_string())
                .filter(|cell| !cell.is_empty())
                .unwrap_or_else(|| application.clone());
            (title, multi_header_table(grid)?)
        }
    };

    let table = drop_placeholder_rows(table);
    let code_column = find_code_column(&table.columns)
        .ok_or_else(|| KatoError::MissingCodeColumn(source.to_string()))?;
    let groups = group_by_code_root(table, code_column);

    Ok(FileExtract {
        source: source.to_string(),
        application,
        title,
        groups,
    })
}

/// Finds the application row and the header row within the preview window.
pub fn locate_rows(grid: &Grid, preview_rows: usize) -> (Option<usize>, Option<usize>) {
    let mut app_idx = None;
    let mut header_idx = None;

    for (idx, row) in grid.iter().take(preview_rows).enumerate() {
        if app_idx.is_none() && APPLICATION_ROW.is_match(&join_non_empty(row).to_lowercase()) {
            app_idx = Some(idx);
        }
        if header_idx.is_none() && row.iter().any(|cell| has_code_marker(cell)) {
            header_idx = Some(idx);
        }
        if app_idx.is_some() && header_idx.is_some() {
            break;
        }
    }

    (app_idx, header_idx)
}

fn has_code_marker(text: &str) -> bool {
    let text = text.to_lowercase();
    HEADER_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Picks the KATO column, preferring a Latin marker over a Cyrillic one.
pub fn find_code_column(columns: &[String]) -> Option<usize> {
    columns
        .iter()
        .position(|column| column.to_lowercase().contains(LATIN_MARKER))
        .or_else(|| {
            columns
                .iter()
                .position(|column| column.contains(CYRILLIC_MARKER))
        })
}

fn join_non_empty(row: &[String]) -> String {
    row.iter()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn grid_width(rows: &[Vec<String>]) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0)
}

fn single_header_table(grid: &Grid, header_idx: usize) -> Table {
    let width = grid_width(&grid[header_idx..]);
    let header = &grid[header_idx];
    let names: Vec<String> = (0..width)
        .map(|col| match header.get(col).map(|cell| cell.trim()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Unnamed: {col}"),
        })
        .collect();

    Table::new(
        make_unique_columns(&names),
        grid[header_idx + 1..].to_vec(),
    )
}

fn multi_header_table(grid: &Grid) -> Result<Table> {
    let last_header = MULTI_HEADER_ROWS[MULTI_HEADER_ROWS.len() - 1];
    if grid.len() <= last_header {
        return Err(KatoError::InvalidWorkbook(format!(
            "expected at least {} rows for a multi-level header, found {}",
            last_header + 1,
            grid.len()
        )));
    }

    let width = grid_width(&grid[MULTI_HEADER_ROWS[0]..]);
    let mut levels: Vec<Vec<String>> = MULTI_HEADER_ROWS
        .iter()
        .map(|&idx| {
            let mut row: Vec<String> = grid[idx].iter().map(|cell| cell.trim().to_string()).collect();
            row.resize(width, String::new());
            row
        })
        .collect();

    // Merged cells in the upper levels only hold a value in their first column.
    let mut control = vec![true; width];
    let upper = levels.len() - 1;
    for level in levels.iter_mut().take(upper) {
        fill_merged_labels(level, &mut control);
    }

    let names: Vec<String> = (0..width)
        .map(|col| {
            let parts: Vec<&str> = levels.iter().map(|level| level[col].as_str()).collect();
            combine_column(&parts)
        })
        .collect();

    Ok(Table::new(
        make_unique_columns(&names),
        grid[last_header + 1..].to_vec(),
    ))
}

/// Forward-fills blank labels within a header level. A fill stops where the
/// level above starts a new label.
fn fill_merged_labels(level: &mut [String], control: &mut [bool]) {
    let Some(first) = level.first() else {
        return;
    };
    let mut last = first.clone();

    for idx in 1..level.len() {
        if !control[idx] {
            last = level[idx].clone();
        }
        if level[idx].is_empty() {
            level[idx] = last.clone();
        } else {
            control[idx] = false;
            last = level[idx].clone();
        }
    }
}

fn drop_placeholder_rows(table: Table) -> Table {
    let Table { columns, rows } = table;
    let rows = rows
        .into_iter()
        .filter(|row| !row.iter().all(|cell| is_placeholder(cell)))
        .collect();
    Table { columns, rows }
}

/// Groups rows by the leading digits of their trimmed code, dropping rows with
/// an empty code or a non-numeric root.
pub fn group_by_code_root(table: Table, code_column: usize) -> Vec<(CodeRoot, Table)> {
    let Table { columns, rows } = table;
    let mut groups: BTreeMap<CodeRoot, Vec<Vec<String>>> = BTreeMap::new();

    for mut row in rows {
        let code = row[code_column].trim().to_string();
        if code.is_empty() {
            continue;
        }
        let root: String = code.chars().take(CODE_ROOT_LEN).collect();
        row[code_column] = code;
        groups.entry(root).or_default().push(row);
    }

    groups
        .into_iter()
        .filter(|(root, _)| root.chars().all(|ch| ch.is_ascii_digit()))
        .map(|(root, rows)| (root, Table::new(columns.clone(), rows)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn title_comes_from_row_after_application_row() {
        let sheet = grid(&[
            &["", "", "1-қосымша"],
            &["Отчёт о", "населённых пунктах"],
            &[],
            &["Код KATO", "Наименование"],
            &["711234000", "Астана"],
        ]);

        let extract = extract_grid(&sheet, "Приложение 1.xlsx", 15).expect("extracted");
        assert_eq!(extract.application, "Приложение-1");
        assert_eq!(extract.title, "Отчёт о населённых пунктах");
        assert_eq!(extract.groups.len(), 1);
        assert_eq!(extract.groups[0].0, "711234");
    }

    #[test]
    fn adjacent_application_row_keeps_label_as_title() {
        let sheet = grid(&[&["3-приложение"], &["KATO", "Value"], &["250211001", "x"]]);
        let extract = extract_grid(&sheet, "report_3.xlsx", 15).expect("extracted");
        assert_eq!(extract.title, "Приложение-3");
    }

    #[test]
    fn blank_header_cells_are_named_by_position() {
        let sheet = grid(&[&["KATO", "", "KATO"], &["111111", "a", "b"]]);
        let extract = extract_grid(&sheet, "f.xlsx", 15).expect("extracted");
        let (_, table) = &extract.groups[0];
        assert_eq!(table.columns, vec!["KATO", "Unnamed: 1", "KATO_1"]);
    }

    #[test]
    fn missing_code_column_is_an_error() {
        let sheet = grid(&[
            &["Отчёт"],
            &["Регион", "Район"],
            &["Область", "Округ"],
            &["a", "b"],
            &["1", "2"],
        ]);
        let result = extract_grid(&sheet, "f.xlsx", 15);
        assert!(matches!(result, Err(KatoError::MissingCodeColumn(name)) if name == "f.xlsx"));
    }

    #[test]
    fn cyrillic_marker_needs_upper_case() {
        let columns = vec!["Индикатор".to_string(), "КАТО".to_string()];
        assert_eq!(find_code_column(&columns), Some(1));

        let columns = vec!["Код като".to_string(), "Значение".to_string()];
        assert_eq!(find_code_column(&columns), None);
    }

    #[test]
    fn latin_marker_wins_over_cyrillic() {
        let columns = vec!["КАТО".to_string(), "Kato code".to_string()];
        assert_eq!(find_code_column(&columns), Some(1));
    }

    #[test]
    fn empty_and_non_numeric_codes_are_excluded() {
        let sheet = grid(&[
            &["kato", "v"],
            &["  ", "empty"],
            &["ABC123", "letters"],
            &["12345X7", "mixed"],
            &[" 550000001 ", "ok"],
            &["nan", "none"],
        ]);
        let extract = extract_grid(&sheet, "f.xlsx", 15).expect("extracted");
        assert_eq!(extract.groups.len(), 1);
        let (root, table) = &extract.groups[0];
        assert_eq!(root, "550000");
        assert_eq!(table.rows, vec![vec!["550000001".to_string(), "ok".to_string()]]);
    }

    #[test]
    fn rows_are_grouped_in_ascending_root_order() {
        let sheet = grid(&[
            &["KATO"],
            &["711234001"],
            &["250211002"],
            &["711234003"],
        ]);
        let extract = extract_grid(&sheet, "f.xlsx", 15).expect("extracted");
        let roots: Vec<&str> = extract.groups.iter().map(|(root, _)| root.as_str()).collect();
        assert_eq!(roots, vec!["250211", "711234"]);
        assert_eq!(extract.groups[1].1.rows.len(), 2);
    }

    #[test]
    fn multi_level_header_is_combined() {
        let sheet = grid(&[
            &["Сводный отчёт"],
            &["Территория", "", "Показатель"],
            &["Код", "", "Всего"],
            &["КАТО", "Наименование", ""],
            &["filt", "None", ""],
            &["591000000", "Петропавловск", "12"],
        ]);
        let extract = extract_grid(&sheet, "свод.xlsx", 15).expect("extracted");
        assert_eq!(extract.title, "Сводный отчёт");
        assert_eq!(extract.application, "Приложение-9999");

        let (root, table) = &extract.groups[0];
        assert_eq!(root, "591000");
        assert_eq!(
            table.columns,
            vec![
                "Территория / Код / КАТО",
                "Территория / Код / Наименование",
                "Показатель / Всего",
            ]
        );
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn fill_stops_where_upper_level_changes() {
        let mut control = vec![true; 4];
        let mut top = vec!["A".to_string(), String::new(), "B".to_string(), String::new()];
        fill_merged_labels(&mut top, &mut control);
        assert_eq!(top, vec!["A", "A", "B", "B"]);

        let mut middle = vec!["x".to_string(), String::new(), String::new(), String::new()];
        fill_merged_labels(&mut middle, &mut control);
        assert_eq!(middle, vec!["x", "x", "", ""]);
    }

    #[test]
    fn short_sheet_without_header_is_rejected() {
        let sheet = grid(&[&["title"], &["a"]]);
        assert!(matches!(
            extract_grid(&sheet, "f.xlsx", 15),
            Err(KatoError::InvalidWorkbook(_))
        ));
    }

    #[test]
    fn recording_twice_adds_nothing_new() {
        let sheet = grid(&[&["KATO", "v"], &["250211001", "1"]]);
        let mut data = KatoData::new();

        let first = extract_grid(&sheet, "a_1.xlsx", 15).expect("extracted");
        let again = first.clone();
        assert_eq!(first.record_into(&mut data), 1);
        assert_eq!(again.record_into(&mut data), 0);

        let entry = data.get("250211").expect("code recorded");
        assert_eq!(entry.contributions("Приложение-1").len(), 1);
    }
}

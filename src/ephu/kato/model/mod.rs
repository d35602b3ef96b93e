use std::collections::{HashMap, HashSet};

use serde::Serialize;

/// First characters of a KATO code identifying the administrative area.
pub type CodeRoot = String;

/// Rectangular text table with unique column names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column names, unique within the table.
    pub columns: Vec<String>,
    /// Rows of cells; every row holds exactly one cell per column.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table, padding or truncating each row to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}

/// One source file's share of a record group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    /// Text rendered in the merged title row above the table.
    pub title: String,
    /// Rows of the source file belonging to the group.
    pub table: Table,
}

/// Identifies a contribution so that a file is counted at most once per group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContributionKey {
    pub code: CodeRoot,
    pub application: String,
    pub source: String,
}

impl ContributionKey {
    pub fn new(
        code: impl Into<CodeRoot>,
        application: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            application: application.into(),
            source: source.into(),
        }
    }
}

/// Contributions of one code root, grouped by application label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeEntry {
    order: Vec<String>,
    groups: HashMap<String, Vec<Contribution>>,
}

impl CodeEntry {
    /// Iterates application labels in first-insertion order.
    pub fn applications(&self) -> impl Iterator<Item = (&str, &[Contribution])> {
        self.order.iter().map(|label| {
            let entries = self
                .groups
                .get(label)
                .map(Vec::as_slice)
                .unwrap_or_default();
            (label.as_str(), entries)
        })
    }

    pub fn contributions(&self, application: &str) -> &[Contribution] {
        self.groups
            .get(application)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn push(&mut self, application: String, contribution: Contribution) {
        if !self.groups.contains_key(&application) {
            self.order.push(application.clone());
        }
        self.groups.entry(application).or_default().push(contribution);
    }
}

/// In-memory accumulation of every record group seen during a run.
///
/// Codes keep the order in which they were first inserted, which is also the
/// order in which workbooks are rendered.
#[derive(Debug, Clone, Default)]
pub struct KatoData {
    order: Vec<CodeRoot>,
    codes: HashMap<CodeRoot, CodeEntry>,
    seen: HashSet<ContributionKey>,
}

impl KatoData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a contribution unless its key was already recorded.
    ///
    /// Returns `false` and leaves the aggregate untouched for a repeated key.
    pub fn insert(&mut self, key: ContributionKey, title: String, table: Table) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key.clone());

        let ContributionKey {
            code, application, ..
        } = key;
        if !self.codes.contains_key(&code) {
            self.order.push(code.clone());
        }
        self.codes
            .entry(code)
            .or_default()
            .push(application, Contribution { title, table });
        true
    }

    pub fn contains(&self, key: &ContributionKey) -> bool {
        self.seen.contains(key)
    }

    /// Iterates code roots with their applications in first-insertion order.
    pub fn codes(&self) -> impl Iterator<Item = (&str, &CodeEntry)> {
        self.order
            .iter()
            .filter_map(|code| self.codes.get(code).map(|entry| (code.as_str(), entry)))
    }

    pub fn get(&self, code: &str) -> Option<&CodeEntry> {
        self.codes.get(code)
    }

    /// Number of distinct code roots.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub deleted_folders: usize,
    pub discovered_files: usize,
    pub processed_files: usize,
    pub skipped_files: usize,
    pub failed_files: usize,
    pub code_roots: usize,
    pub written: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(code: &str) -> Table {
        Table::new(
            vec!["KATO".into(), "Name".into()],
            vec![vec![code.into(), "row".into()]],
        )
    }

    #[test]
    fn repeated_key_is_ignored() {
        let mut data = KatoData::new();
        let key = ContributionKey::new("250211", "Приложение-1", "a.xlsx");

        assert!(data.insert(key.clone(), "t".into(), table("250211001")));
        assert!(!data.insert(key.clone(), "t".into(), table("250211001")));

        let entry = data.get("250211").expect("code recorded");
        assert_eq!(entry.contributions("Приложение-1").len(), 1);
        assert!(data.contains(&key));
    }

    #[test]
    fn distinct_sources_accumulate_in_insertion_order() {
        let mut data = KatoData::new();
        data.insert(
            ContributionKey::new("711234", "Приложение-2", "b.xlsx"),
            "b".into(),
            table("711234"),
        );
        data.insert(
            ContributionKey::new("250211", "Приложение-1", "a.xlsx"),
            "a".into(),
            table("250211"),
        );
        data.insert(
            ContributionKey::new("711234", "Приложение-1", "c.xlsx"),
            "c".into(),
            table("711234"),
        );

        let codes: Vec<&str> = data.codes().map(|(code, _)| code).collect();
        assert_eq!(codes, vec!["711234", "250211"]);

        let apps: Vec<&str> = data
            .get("711234")
            .expect("code recorded")
            .applications()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(apps, vec!["Приложение-2", "Приложение-1"]);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn table_rows_are_normalised_to_column_count() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()], vec!["1".into(), "2".into(), "3".into()]],
        );
        assert!(table.rows.iter().all(|row| row.len() == 2));
    }
}

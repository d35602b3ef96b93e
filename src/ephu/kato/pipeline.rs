use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, instrument, warn};

use crate::ephu::kato::config::SorterConfig;
use crate::ephu::kato::error::{KatoError, Result};
use crate::ephu::kato::extract;
use crate::ephu::kato::io::{excel_write, fs as sorter_fs};
use crate::ephu::kato::layout::build_workbook;
use crate::ephu::kato::model::{KatoData, RunSummary};
use crate::ephu::kato::region::region_for;

/// Name prefix of the lock files Excel leaves next to open workbooks.
const LOCK_FILE_PREFIX: &str = "~$";

/// Runs cleanup, extraction and rendering in sequence.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %config.input_dir.display(), output = %config.output_dir.display())
)]
pub fn run(config: SorterConfig, cleanup: bool) -> Result<RunSummary> {
    let mut sorter = Sorter::new(config)?;
    if cleanup {
        sorter.cleanup()?;
    }
    sorter.process_files()?;
    sorter.save_files()?;
    Ok(sorter.into_summary())
}

/// Holds the state of one run: the aggregate, the codes already written and
/// the counters reported at the end.
#[derive(Debug)]
pub struct Sorter {
    config: SorterConfig,
    data: KatoData,
    saved: HashSet<String>,
    summary: RunSummary,
}

impl Sorter {
    /// Prepares a run, creating the output root if needed.
    pub fn new(config: SorterConfig) -> Result<Self> {
        if !config.input_dir.exists() {
            return Err(KatoError::MissingInput(config.input_dir.clone()));
        }
        fs::create_dir_all(&config.output_dir)?;
        Ok(Self {
            config,
            data: KatoData::new(),
            saved: HashSet::new(),
            summary: RunSummary::default(),
        })
    }

    pub fn data(&self) -> &KatoData {
        &self.data
    }

    pub fn into_summary(mut self) -> RunSummary {
        self.summary.code_roots = self.data.len();
        self.summary
    }

    /// Removes stale generated folders below the input root.
    pub fn cleanup(&mut self) -> Result<usize> {
        let deleted =
            sorter_fs::delete_prefixed_dirs(&self.config.input_dir, &self.config.cleanup_prefix)?;
        self.summary.deleted_folders += deleted;
        Ok(deleted)
    }

    /// Extracts every source workbook below the input root into the aggregate.
    ///
    /// A file that fails is logged and skipped; the run carries on.
    #[instrument(level = "info", skip_all)]
    pub fn process_files(&mut self) -> Result<()> {
        let output_root = fs::canonicalize(&self.config.output_dir)?;
        let files: Vec<PathBuf> =
            sorter_fs::find_spreadsheets(&self.config.input_dir, &self.config.extension)
                .into_iter()
                .filter(|path| !is_lock_file(path) && !is_under(path, &output_root))
                .collect();
        self.summary.discovered_files += files.len();
        info!(count = files.len(), "found source workbooks");

        for path in &files {
            match self.process_file(path) {
                Ok(added) => {
                    self.summary.processed_files += 1;
                    info!(file = %path.display(), added, "processed file");
                }
                Err(KatoError::MissingCodeColumn(file)) => {
                    self.summary.skipped_files += 1;
                    warn!(file, "no KATO column, skipping file");
                }
                Err(err) => {
                    self.summary.failed_files += 1;
                    error!(file = %path.display(), error = %err, "failed to process file");
                }
            }
        }

        Ok(())
    }

    /// Extracts one workbook and returns how many new groups it contributed.
    pub fn process_file(&mut self, path: &Path) -> Result<usize> {
        let extract = extract::extract_file(path, self.config.preview_rows)?;
        debug!(
            application = %extract.application,
            groups = extract.groups.len(),
            "extracted groups"
        );
        Ok(extract.record_into(&mut self.data))
    }

    /// Writes one workbook per code root into its region folder.
    ///
    /// A code on the skip list is written at most once per run.
    #[instrument(level = "info", skip_all)]
    pub fn save_files(&mut self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for (code, entry) in self.data.codes() {
            if self.config.skip_list.iter().any(|skip| skip == code) && self.saved.contains(code) {
                info!(code, "skipping repeated code");
                continue;
            }

            let region_dir = self.config.output_dir.join(region_for(code));
            fs::create_dir_all(&region_dir)?;

            let workbook = build_workbook(entry, self.config.max_width);
            let output_path = region_dir.join(format!("{code}.xlsx"));
            excel_write::write_workbook(&output_path, &workbook)?;
            info!(path = %output_path.display(), sheets = workbook.sheets.len(), "saved workbook");

            self.saved.insert(code.to_string());
            self.summary
                .written
                .push(output_path.display().to_string());
            written.push(output_path);
        }

        info!(count = written.len(), output = %self.config.output_dir.display(), "all workbooks saved");
        Ok(written)
    }
}

fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with(LOCK_FILE_PREFIX))
        .unwrap_or(false)
}

fn is_under(path: &Path, root: &Path) -> bool {
    fs::canonicalize(path)
        .map(|path| path.starts_with(root))
        .unwrap_or(false)
}

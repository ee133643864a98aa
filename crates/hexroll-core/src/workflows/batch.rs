use crate::core::models::params::{ChiralIndex, ParameterError, TubeClass};
use crate::engine::config::GenerationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::workflows::generate;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// A directory that batch output is written into.
///
/// Holding an `OutputDirectory` is the only way to get files written by
/// [`run`]; the destructive wipe happens only through [`OutputDirectory::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirectory {
    path: PathBuf,
}

impl OutputDirectory {
    /// Deletes `path` with everything in it, then recreates it empty.
    ///
    /// The wipe completes before this returns, so no file of the new batch can be written
    /// into a half-cleared directory.
    pub fn reset(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let io_error = |source| EngineError::OutputDirectory {
            path: path.clone(),
            source,
        };
        if path.exists() {
            info!("Resetting output directory '{}'.", path.display());
            fs::remove_dir_all(&path).map_err(io_error)?;
        }
        fs::create_dir_all(&path).map_err(io_error)?;
        Ok(Self { path })
    }

    /// Uses `path` as is, creating it if needed. Existing files are kept.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        fs::create_dir_all(&path).map_err(|source| EngineError::OutputDirectory {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full path of `filename` inside the directory.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] unless `filename` is a bare file name.
    pub fn file_path(&self, filename: &str) -> Result<PathBuf, EngineError> {
        check_bare_filename(filename)?;
        Ok(self.path.join(filename))
    }
}

fn check_bare_filename(filename: &str) -> Result<(), EngineError> {
    let bare = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\']);
    if !bare {
        return Err(ParameterError::invalid(
            "filename",
            filename,
            "must be a bare file name without directories",
        )
        .into());
    }
    Ok(())
}

/// One structure of a batch: its output file name and generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub filename: String,
    pub config: GenerationConfig,
}

/// Whether a failed entry stops the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error.
    Abort,
    /// Generate every entry and record each failure in the report.
    #[default]
    Continue,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub filename: String,
    /// Number of atoms written, or why the entry failed.
    pub result: Result<usize, EngineError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// A series of tubes of one class with growing index `n = start + i · step`.
///
/// Armchair series are `(n, n)`, zigzag series `(n, 0)` and chiral series
/// `(n, max(n - 2, 1))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesSpec {
    pub class: TubeClass,
    pub count: usize,
    pub start: u32,
    pub step: u32,
}

impl SeriesSpec {
    pub const DEFAULT_START: u32 = 3;

    pub fn default_step(class: TubeClass) -> u32 {
        match class {
            TubeClass::Armchair | TubeClass::Zigzag => 3,
            TubeClass::Chiral => 2,
        }
    }

    pub fn new(class: TubeClass, count: usize) -> Self {
        Self {
            class,
            count,
            start: Self::DEFAULT_START,
            step: Self::default_step(class),
        }
    }

    pub fn chiralities(&self) -> Result<Vec<ChiralIndex>, ParameterError> {
        if self.step == 0 && self.count > 1 {
            return Err(ParameterError::invalid(
                "step",
                self.step,
                "must be at least 1 for series longer than one tube",
            ));
        }
        (0..self.count)
            .map(|i| {
                let n = i64::from(self.start) + i as i64 * i64::from(self.step);
                let m = match self.class {
                    TubeClass::Armchair => n,
                    TubeClass::Zigzag => 0,
                    TubeClass::Chiral => (n - 2).max(1),
                };
                let chirality = ChiralIndex::new(n, m)?;
                if chirality.class() != self.class {
                    return Err(ParameterError::invalid(
                        "start",
                        self.start,
                        "is too small to produce a tube of the requested class",
                    ));
                }
                Ok(chirality)
            })
            .collect()
    }
}

/// Conventional file name of a tube in a series, e.g. `Z_AlPNT_5x0.cif`.
pub fn series_filename(chirality: &ChiralIndex, compound: &str) -> String {
    format!(
        "{}_{}NT_{}x{}.cif",
        chirality.class().prefix(),
        compound,
        chirality.n(),
        chirality.m()
    )
}

/// Rejects batches whose file names are not bare or not unique.
///
/// [`run`] does this itself; callers that reset the output directory should call it
/// first so that a rejected batch does not wipe the previous results.
pub fn check_filenames(entries: &[BatchEntry]) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for entry in entries {
        check_bare_filename(&entry.filename)?;
        if !seen.insert(entry.filename.as_str()) {
            return Err(EngineError::DuplicateOutput {
                filename: entry.filename.clone(),
            });
        }
    }
    Ok(())
}

fn process(
    entry: &BatchEntry,
    output: &OutputDirectory,
    reporter: &ProgressReporter,
) -> BatchOutcome {
    let result = output
        .file_path(&entry.filename)
        .and_then(|path| generate::run_to_path(&entry.config, &path))
        .map(|structure| structure.len());
    match &result {
        Ok(atoms) => debug!("{}: {} atoms.", entry.filename, atoms),
        Err(e) => warn!("{} failed: {}", entry.filename, e),
    }
    reporter.report(Progress::StructureDone {
        name: entry.filename.clone(),
        success: result.is_ok(),
    });
    reporter.report(Progress::TaskIncrement);
    BatchOutcome {
        filename: entry.filename.clone(),
        result,
    }
}

/// Generates every entry into `output`, in parallel.
///
/// Entries are independent; each writes only its own file. Outcomes are reported in
/// entry order.
///
/// # Errors
///
/// Returns [`EngineError::DuplicateOutput`] or [`EngineError::InvalidParameter`] for bad
/// file names before any structure is generated. Under [`FailurePolicy::Abort`] the first
/// failing entry's error is returned; entries already finished keep their files.
#[instrument(skip_all, name = "batch_workflow", fields(entries = entries.len()))]
pub fn run(
    entries: &[BatchEntry],
    output: &OutputDirectory,
    policy: FailurePolicy,
    reporter: &ProgressReporter,
) -> Result<BatchReport, EngineError> {
    check_filenames(entries)?;

    reporter.report(Progress::PhaseStart { name: "Generation" });
    reporter.report(Progress::TaskStart {
        total_steps: entries.len() as u64,
    });

    let outcomes: Vec<BatchOutcome> = match policy {
        FailurePolicy::Continue => entries
            .par_iter()
            .map(|entry| process(entry, output, reporter))
            .collect(),
        FailurePolicy::Abort => {
            let collected: Result<Vec<BatchOutcome>, EngineError> = entries
                .par_iter()
                .map(|entry| {
                    let outcome = process(entry, output, reporter);
                    match outcome.result {
                        Ok(atoms) => Ok(BatchOutcome {
                            filename: outcome.filename,
                            result: Ok(atoms),
                        }),
                        Err(e) => Err(e),
                    }
                })
                .collect();
            reporter.report(Progress::TaskFinish);
            reporter.report(Progress::PhaseFinish);
            collected?
        }
    };
    if policy == FailurePolicy::Continue {
        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);
    }

    let report = BatchReport { outcomes };
    info!(
        "Batch complete: {} written, {} failed, into '{}'.",
        report.succeeded().count(),
        report.failed().count(),
        output.path().display()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::params::LatticeParams;
    use crate::engine::config::{GenerationConfigBuilder, StructureKind, VacuumStrategy};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn entry(n: i64, m: i64, filename: &str) -> BatchEntry {
        BatchEntry {
            filename: filename.to_string(),
            config: GenerationConfigBuilder::new()
                .structure(StructureKind::tube(ChiralIndex::new(n, m).unwrap()))
                .lattice(LatticeParams::from_bond_length(2.27).unwrap())
                .build()
                .unwrap(),
        }
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn reset_leaves_exactly_the_new_batch() {
        let root = tempdir().unwrap();
        let out = root.path().join("AlPNT");
        fs::create_dir_all(out.join("stale")).unwrap();
        fs::write(out.join("old.cif"), "leftover").unwrap();

        let output = OutputDirectory::reset(&out).unwrap();
        let entries = vec![
            entry(5, 0, "Z_AlPNT_5x0.cif"),
            entry(3, 3, "A_AlPNT_3x3.cif"),
            entry(5, 3, "C_AlPNT_5x3.cif"),
        ];
        let report = run(&entries, &output, FailurePolicy::Abort, &ProgressReporter::new()).unwrap();

        assert!(report.is_success());
        assert_eq!(
            files_in(&out),
            vec!["A_AlPNT_3x3.cif", "C_AlPNT_5x3.cif", "Z_AlPNT_5x0.cif"]
        );
    }

    #[test]
    fn open_keeps_existing_files() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("keep.cif"), "x").unwrap();
        let output = OutputDirectory::open(root.path()).unwrap();
        run(&[entry(5, 0, "new.cif")], &output, FailurePolicy::Continue, &ProgressReporter::new()).unwrap();
        assert_eq!(files_in(root.path()), vec!["keep.cif", "new.cif"]);
    }

    #[test]
    fn duplicate_filenames_are_rejected_before_writing() {
        let root = tempdir().unwrap();
        let output = OutputDirectory::open(root.path()).unwrap();
        let entries = vec![entry(5, 0, "same.cif"), entry(6, 0, "same.cif")];
        let result = run(&entries, &output, FailurePolicy::Continue, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::DuplicateOutput { .. })));
        assert!(files_in(root.path()).is_empty());
    }

    #[test]
    fn filenames_are_checked_without_an_output_directory() {
        assert!(check_filenames(&[entry(5, 0, "a.cif"), entry(6, 0, "b.cif")]).is_ok());
        assert!(matches!(
            check_filenames(&[entry(5, 0, "a.cif"), entry(6, 0, "a.cif")]),
            Err(EngineError::DuplicateOutput { .. })
        ));
        assert!(matches!(
            check_filenames(&[entry(5, 0, "sub/a.cif")]),
            Err(EngineError::InvalidParameter { name: "filename", .. })
        ));
    }

    #[test]
    fn nested_filenames_are_rejected() {
        let root = tempdir().unwrap();
        let output = OutputDirectory::open(root.path()).unwrap();
        assert!(output.file_path("../escape.cif").is_err());
        assert!(output.file_path("").is_err());
        assert!(output.file_path("ok.cif").is_ok());
    }

    #[test]
    fn continue_policy_records_failures_and_keeps_going() {
        let root = tempdir().unwrap();
        let output = OutputDirectory::open(root.path()).unwrap();
        let mut bad = entry(5, 0, "bad.cif");
        bad.config.vacuum = VacuumStrategy::Fixed { size: 0.0 };
        let entries = vec![entry(5, 0, "good.cif"), bad];

        let done = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StructureDone { .. } = event {
                done.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let report = run(&entries, &output, FailurePolicy::Continue, &reporter).unwrap();
        drop(reporter);

        assert_eq!(report.succeeded().count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert_eq!(report.outcomes[1].filename, "bad.cif");
        assert!(matches!(
            report.outcomes[1].result,
            Err(EngineError::InvalidParameter { name: "vacuum", .. })
        ));
        assert_eq!(done.load(Ordering::SeqCst), 2);
        assert_eq!(files_in(root.path()), vec!["good.cif"]);
    }

    #[test]
    fn abort_policy_returns_the_failure() {
        let root = tempdir().unwrap();
        let output = OutputDirectory::open(root.path()).unwrap();
        let mut bad = entry(5, 0, "bad.cif");
        bad.config.vacuum = VacuumStrategy::Adaptive { buffer: -1.0 };
        let result = run(&[bad], &output, FailurePolicy::Abort, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::InvalidParameter { name: "buffer", .. })));
        assert!(files_in(root.path()).is_empty());
    }

    #[test]
    fn series_follow_the_class_conventions() {
        let armchair = SeriesSpec::new(TubeClass::Armchair, 3).chiralities().unwrap();
        assert_eq!(
            armchair.iter().map(|c| (c.n(), c.m())).collect::<Vec<_>>(),
            vec![(3, 3), (6, 6), (9, 9)]
        );
        let zigzag = SeriesSpec::new(TubeClass::Zigzag, 2).chiralities().unwrap();
        assert_eq!(
            zigzag.iter().map(|c| (c.n(), c.m())).collect::<Vec<_>>(),
            vec![(3, 0), (6, 0)]
        );
        let chiral = SeriesSpec::new(TubeClass::Chiral, 3).chiralities().unwrap();
        assert_eq!(
            chiral.iter().map(|c| (c.n(), c.m())).collect::<Vec<_>>(),
            vec![(3, 1), (5, 3), (7, 5)]
        );
    }

    #[test]
    fn series_rejects_starts_that_change_the_class() {
        let spec = SeriesSpec {
            class: TubeClass::Chiral,
            count: 2,
            start: 1,
            step: 2,
        };
        assert!(spec.chiralities().is_err());
    }

    #[test]
    fn series_filenames_use_class_prefix_and_indices() {
        let chirality = ChiralIndex::new(5, 3).unwrap();
        assert_eq!(series_filename(&chirality, "AlP"), "C_AlPNT_5x3.cif");
        let zigzag = ChiralIndex::new(12, 0).unwrap();
        assert_eq!(series_filename(&zigzag, "BN"), "Z_BNNT_12x0.cif");
    }
}

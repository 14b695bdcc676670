use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{GrfError, Result};
use crate::grf::GrfEntry;
use crate::grffile::GrfFile;
use crate::read::entry::decode_entry;

type EntryFilter = dyn Fn(&GrfEntry) -> bool + Send + Sync;

#[derive(Debug, Clone)]
pub enum ExtractEvent {
    Start {
        total: usize,
    },
    FileStart {
        path: PathBuf,
    },
    FileDone {
        path: PathBuf,
        error: Option<String>,
    },
    Finish {
        extracted: usize,
        skipped: usize,
        failed: usize,
    },
    Aborted,
}

#[derive(Debug, Default)]
pub struct ExtractReport {
    pub extracted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// `(archive path, output path, message)` per failed entry.
    pub errors: Vec<(String, PathBuf, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    Parallel,
    Sequential,
}

impl Default for ExtractMode {
    fn default() -> Self {
        Self::Parallel
    }
}

pub struct GrfExtractBuilder<'a> {
    grf: &'a GrfFile,
    output_dir: PathBuf,
    mode: ExtractMode,
    threads: Option<usize>,
    overwrite: bool,
    continue_on_error: bool,
    filter: Option<Arc<EntryFilter>>,
    on_event: Option<Arc<dyn Fn(ExtractEvent) + Send + Sync>>,
    cancel_flag: Option<Arc<AtomicBool>>,
}

impl<'a> GrfExtractBuilder<'a> {
    pub fn new(grf: &'a GrfFile, output_dir: impl AsRef<Path>) -> Self {
        Self {
            grf,
            output_dir: output_dir.as_ref().to_path_buf(),
            mode: ExtractMode::default(),
            threads: None,
            overwrite: false,
            continue_on_error: false,
            filter: None,
            on_event: None,
            cancel_flag: None,
        }
    }

    pub fn mode(mut self, mode: ExtractMode) -> Self {
        self.mode = mode;
        self
    }

    /// Size of a dedicated thread pool; the global rayon pool is used otherwise.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&GrfEntry) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn on_event<F>(mut self, on_event: F) -> Self
    where
        F: Fn(ExtractEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Arc::new(on_event));
        self
    }

    pub fn cancel_flag(mut self, cancel_flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = Some(cancel_flag);
        self
    }

    pub fn run(self) -> Result<ExtractReport> {
        if !self.output_dir.exists() {
            std::fs::create_dir_all(&self.output_dir)?;
        }

        let mut tasks: Vec<(&GrfEntry, PathBuf)> = Vec::new();
        let mut skipped = 0usize;

        for entry in self.grf.entries().map(|e| e.entry()) {
            if let Some(filter) = &self.filter
                && !filter(entry)
            {
                skipped += 1;
                continue;
            }

            let Some(rel_path) = output_path(entry.path()) else {
                warn!(path = entry.path(), "entry path has no usable components, skipping");
                skipped += 1;
                continue;
            };

            tasks.push((entry, rel_path));
        }

        self.emit(|| ExtractEvent::Start { total: tasks.len() });

        if self.should_abort() {
            self.emit(|| ExtractEvent::Aborted);
            return Ok(ExtractReport {
                skipped,
                ..Default::default()
            });
        }

        let errors: Mutex<Vec<(String, PathBuf, String)>> = Mutex::new(vec![]);
        let extracted = AtomicUsize::new(0);

        // Extracts one task and records the outcome; the error is handed back
        // so fail-fast modes can stop.
        let process = |entry: &GrfEntry, rel_path: &PathBuf| -> Result<()> {
            self.emit(|| ExtractEvent::FileStart { path: rel_path.clone() });
            let result = self.extract_one(entry, &self.output_dir.join(rel_path));
            match &result {
                Ok(()) => {
                    extracted.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    errors
                        .lock()
                        .push((entry.path().to_string(), rel_path.clone(), e.to_string()));
                }
            }
            self.emit(|| ExtractEvent::FileDone {
                path: rel_path.clone(),
                error: result.as_ref().err().map(|e| e.to_string()),
            });
            result
        };

        let work = || -> Result<()> {
            match (self.mode, self.continue_on_error) {
                (ExtractMode::Sequential, _) => {
                    for (entry, rel_path) in &tasks {
                        if self.should_abort() {
                            return Ok(());
                        }
                        let result = process(*entry, rel_path);
                        if !self.continue_on_error {
                            result?;
                        }
                    }
                }
                (ExtractMode::Parallel, false) => {
                    tasks.par_iter().try_for_each(|(entry, rel_path)| -> Result<()> {
                        if self.should_abort() {
                            return Ok(());
                        }
                        process(*entry, rel_path)
                    })?;
                }
                (ExtractMode::Parallel, true) => {
                    tasks.par_iter().for_each(|(entry, rel_path)| {
                        if self.should_abort() {
                            return;
                        }
                        let _ = process(*entry, rel_path);
                    });
                }
            }
            Ok(())
        };

        if self.mode == ExtractMode::Parallel
            && let Some(n) = self.threads
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| GrfError::ThreadPoolBuild(e.to_string()))?;
            pool.install(work)?;
        } else {
            work()?;
        }

        let extracted = extracted.load(Ordering::Relaxed);
        let errors = errors.into_inner();
        let failed = errors.len();

        if self.should_abort() {
            self.emit(|| ExtractEvent::Aborted);
        }
        self.emit(|| ExtractEvent::Finish {
            extracted,
            skipped,
            failed,
        });
        debug!(extracted, skipped, failed, "extraction finished");

        Ok(ExtractReport {
            extracted,
            skipped,
            failed,
            errors,
        })
    }

    fn emit(&self, event: impl FnOnce() -> ExtractEvent) {
        if let Some(on_event) = &self.on_event {
            on_event(event());
        }
    }

    fn should_abort(&self) -> bool {
        if let Some(flag) = &self.cancel_flag {
            return flag.load(Ordering::Relaxed);
        }
        false
    }

    fn extract_one(&self, entry: &GrfEntry, out_path: &Path) -> Result<()> {
        // decode first so a bad entry leaves no empty file behind
        let raw = self.grf.read_raw(entry)?;
        let data = decode_entry(raw, entry)?;

        if let Some(parent) = out_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut open_options = OpenOptions::new();
        if self.overwrite {
            open_options.create(true).write(true).truncate(true);
        } else {
            open_options.create_new(true).write(true);
        }
        let mut file = open_options.open(out_path)?;
        file.write_all(&data)?;
        file.flush()?;

        Ok(())
    }
}

impl GrfFile {
    pub fn extractor(&self, output_dir: impl AsRef<Path>) -> GrfExtractBuilder<'_> {
        GrfExtractBuilder::new(self, output_dir)
    }
}

/// Relative output path for an archive path, or `None` if nothing usable is left.
///
/// Both separators split components; empty, `.` and `..` components are dropped
/// so an entry can never land outside the output directory.
pub fn output_path(entry_path: &str) -> Option<PathBuf> {
    let path: PathBuf = entry_path
        .split(['\\', '/'])
        .filter(|c| !c.is_empty() && *c != "." && *c != "..")
        .collect();
    if path.as_os_str().is_empty() { None } else { Some(path) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grf::GrfVersion;
    use crate::test_util::{FixtureEntry, build_legacy, build_v200, write_temp};

    fn reference_grf() -> (tempfile::NamedTempFile, GrfFile) {
        let file = write_temp(&build_legacy(GrfVersion::V102, 0, &FixtureEntry::reference_set()));
        let grf = GrfFile::open(file.path()).unwrap();
        (file, grf)
    }

    fn on_disk(root: &Path, entry_path: &str) -> PathBuf {
        root.join(output_path(entry_path).unwrap())
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path("data\\texture\\a.bmp").unwrap(), Path::new("data/texture/a.bmp"));
        assert_eq!(output_path("..\\..\\etc\\passwd").unwrap(), Path::new("etc/passwd"));
        assert_eq!(output_path("\\data\\.\\\\b.txt").unwrap(), Path::new("data/b.txt"));
        assert!(output_path("..\\.\\").is_none());
        assert!(output_path("").is_none());
    }

    #[test]
    fn test_extract_all_modes() {
        let (_file, grf) = reference_grf();
        let expected = FixtureEntry::reference_set();
        for mode in [ExtractMode::Sequential, ExtractMode::Parallel] {
            let out = tempfile::tempdir().unwrap();
            let report = grf.extractor(out.path()).mode(mode).threads(2).run().unwrap();
            assert_eq!(report.extracted, 9, "{mode:?}");
            assert_eq!(report.failed, 0);
            assert_eq!(report.skipped, 0);
            for fixture in &expected {
                let written = std::fs::read(on_disk(out.path(), &fixture.path)).unwrap();
                assert_eq!(written, fixture.data, "{}", fixture.path);
            }
        }
    }

    #[test]
    fn test_filter() {
        let (_file, grf) = reference_grf();
        let out = tempfile::tempdir().unwrap();
        let report = grf
            .extractor(out.path())
            .filter(|entry| entry.kind() == "txt")
            .run()
            .unwrap();
        assert_eq!(report.extracted, 4);
        assert_eq!(report.skipped, 5);
        assert!(on_disk(out.path(), "data\\11001.txt").exists());
        assert!(!on_disk(out.path(), "data\\balls.wav").exists());
    }

    #[test]
    fn test_overwrite_and_continue_on_error() {
        let (_file, grf) = reference_grf();
        let out = tempfile::tempdir().unwrap();
        grf.extractor(out.path()).run().unwrap();

        let report = grf
            .extractor(out.path())
            .mode(ExtractMode::Sequential)
            .continue_on_error(true)
            .run()
            .unwrap();
        assert_eq!(report.extracted, 0);
        assert_eq!(report.failed, 9);
        assert_eq!(report.errors.len(), 9);

        let result = grf.extractor(out.path()).run();
        assert!(matches!(result, Err(GrfError::IO(_))));

        let report = grf.extractor(out.path()).overwrite(true).run().unwrap();
        assert_eq!(report.extracted, 9);
    }

    #[test]
    fn test_corrupt_entry_reported() {
        let mut bytes = build_v200(&[
            FixtureEntry::file("data\\good.txt", b"good"),
            FixtureEntry::file("data\\bad.txt", b"bad payload, soon to be broken"),
        ]);
        let grf_file = write_temp(&bytes);
        let grf = GrfFile::open(grf_file.path()).unwrap();
        let bad = grf.find("data\\bad.txt").unwrap().entry().offset() as usize;
        bytes[bad..bad + 8].fill(0xAA);
        let broken = write_temp(&bytes);
        let grf = GrfFile::open(broken.path()).unwrap();

        let out = tempfile::tempdir().unwrap();
        let report = grf.extractor(out.path()).continue_on_error(true).run().unwrap();
        assert_eq!(report.extracted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].0, "data\\bad.txt");
        assert!(!on_disk(out.path(), "data\\bad.txt").exists());
    }

    #[test]
    fn test_events_and_cancel() {
        let (_file, grf) = reference_grf();
        let out = tempfile::tempdir().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        grf.extractor(out.path())
            .mode(ExtractMode::Sequential)
            .on_event(move |event| sink.lock().push(event))
            .run()
            .unwrap();
        let events = events.lock();
        assert!(matches!(events.first(), Some(ExtractEvent::Start { total: 9 })));
        assert_eq!(events.iter().filter(|e| matches!(e, ExtractEvent::FileDone { error: None, .. })).count(), 9);
        assert!(matches!(
            events.last(),
            Some(ExtractEvent::Finish {
                extracted: 9,
                skipped: 0,
                failed: 0
            })
        ));

        let cancel = Arc::new(AtomicBool::new(true));
        let out = tempfile::tempdir().unwrap();
        let report = grf.extractor(out.path()).cancel_flag(cancel).run().unwrap();
        assert_eq!(report.extracted, 0);
        assert!(!on_disk(out.path(), "data\\11001.txt").exists());
    }
}

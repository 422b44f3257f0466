pub mod link_dir;

use crate::segment::filename::{camel_case_names_limited, lower_case_name};
use crate::segment::Segmenter;
use crate::{FileFailure, LinkReport};
use link_dir::{DirId, FsLinkDir, LinkDir, LinkError, LinkOutcome};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct LinkOptions {
    /// Replace aliases that already exist as links.
    pub overwrite: bool,
    /// Record filesystem failures and keep going instead of aborting.
    pub skip_errors: bool,
    pub dry_run: bool,
    /// Cap on CamelCase aliases per file.
    pub max_candidates: Option<usize>,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            skip_errors: false,
            dry_run: false,
            max_candidates: None,
        }
    }
}

pub struct Linker<'v> {
    segmenter: Segmenter<'v>,
    options: LinkOptions,
}

impl<'v> Linker<'v> {
    pub fn new(segmenter: Segmenter<'v>, options: LinkOptions) -> Self {
        Self { segmenter, options }
    }

    /// Walk every path and give each regular file its aliases.
    ///
    /// Symlinks are never followed or aliased. Segmentation failures are
    /// recorded and never stop the run; filesystem failures do unless
    /// `skip_errors` is set.
    ///
    /// Each directory's files are visited before its subdirectories, so one
    /// open handle serves all of them. The handle must be the directory the
    /// walk listed, otherwise its files fail.
    pub fn run(&self, paths: &[PathBuf]) -> Result<LinkReport, RunError> {
        let mut report = LinkReport::default();

        for root in paths {
            let mut listed: Option<(PathBuf, DirId)> = None;
            let mut current: Option<FsLinkDir> = None;

            let walk = WalkDir::new(root)
                .follow_links(false)
                .follow_root_links(false)
                .sort_by(|a, b| {
                    a.file_type()
                        .is_dir()
                        .cmp(&b.file_type().is_dir())
                        .then_with(|| a.file_name().cmp(b.file_name()))
                });

            for entry in walk {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) if self.options.skip_errors => {
                        let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                        error!("Failed to read {}: {}", path.display(), e);
                        report.failures.push(FileFailure {
                            path,
                            reason: e.to_string(),
                        });
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                if entry.file_type().is_dir() {
                    listed = entry
                        .metadata()
                        .ok()
                        .map(|meta| (entry.path().to_path_buf(), DirId::of(&meta)));
                    continue;
                }
                if !entry.file_type().is_file() {
                    continue;
                }

                let path = entry.path();
                let dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };

                if current.as_ref().map_or(true, |open| open.path() != dir) {
                    current = None;
                    match self.open_dir(dir, listed.as_ref()) {
                        Ok(link_dir) => current = Some(link_dir),
                        Err(e) => {
                            report.files_seen += 1;
                            self.settle(path, Err(e), &mut report)?;
                            continue;
                        }
                    }
                }

                if let Some(link_dir) = &current {
                    self.link_entry(link_dir, path, &mut report)?;
                }
            }
        }

        Ok(report)
    }

    /// Link one file found at `path` inside `dir`, applying the
    /// `skip_errors` policy to whatever goes wrong.
    pub fn link_entry(
        &self,
        dir: &impl LinkDir,
        path: &Path,
        report: &mut LinkReport,
    ) -> Result<(), LinkError> {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping non UTF-8 file name {}", path.display());
            return Ok(());
        };

        report.files_seen += 1;
        let linked = self.link_file(dir, filename, report);
        self.settle(path, linked, report)
    }

    /// Create the lowercase alias and every CamelCase alias of `filename`
    /// inside `dir`.
    pub fn link_file(
        &self,
        dir: &impl LinkDir,
        filename: &str,
        report: &mut LinkReport,
    ) -> Result<(), LinkError> {
        let lower = lower_case_name(filename);
        self.ensure(dir, filename, &lower, report)?;

        let names =
            match camel_case_names_limited(filename, &self.segmenter, self.options.max_candidates) {
                Ok(names) => names,
                Err(e) => {
                    warn!("{}", e);
                    report.unsegmented.push(filename.to_string());
                    return Ok(());
                }
            };
        debug!("{} -> {:?}", filename, names);

        for name in &names {
            self.ensure(dir, filename, name, report)?;
        }

        Ok(())
    }

    fn ensure(
        &self,
        dir: &impl LinkDir,
        target: &str,
        name: &str,
        report: &mut LinkReport,
    ) -> Result<(), LinkError> {
        let outcome = dir.ensure_link(target, name, self.options.overwrite)?;
        let verb = if self.options.dry_run { "Would symlink" } else { "Symlink" };

        match outcome {
            LinkOutcome::Created => {
                info!("{} {} -> {}", verb, target, name);
                report.links_created += 1;
            }
            LinkOutcome::Replaced => {
                info!("{} {} -> {} (replaced)", verb, target, name);
                report.links_replaced += 1;
            }
            LinkOutcome::AlreadyLink => {
                debug!("{} already exists", name);
                report.links_kept += 1;
            }
            LinkOutcome::OccupiedByFile => {
                // Includes the alias that equals the file's own name.
                if name != target {
                    info!("{} already exists", name);
                }
                report.occupied += 1;
            }
        }

        Ok(())
    }

    fn open_dir(
        &self,
        dir: &Path,
        listed: Option<&(PathBuf, DirId)>,
    ) -> Result<FsLinkDir, LinkError> {
        let link_dir = FsLinkDir::open(dir)?.dry_run(self.options.dry_run);
        let changed = |source: io::Error| LinkError {
            link: dir.to_path_buf(),
            source,
        };

        if let Some((_, expected)) = listed.filter(|(seen, _)| seen == dir) {
            if link_dir.identity().map_err(changed)? != *expected {
                return Err(changed(io::Error::new(
                    io::ErrorKind::Other,
                    "directory changed during the walk",
                )));
            }
        }

        Ok(link_dir)
    }

    fn settle(
        &self,
        path: &Path,
        result: Result<(), LinkError>,
        report: &mut LinkReport,
    ) -> Result<(), LinkError> {
        match result {
            Err(e) if self.options.skip_errors => {
                error!("Failed symlink for {}. Error: {}", path.display(), e);
                report.failures.push(FileFailure {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::VocabularyIndex;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// In-memory directory: name -> Some(target) for links, None for files.
    #[derive(Default)]
    struct MemDir {
        entries: RefCell<BTreeMap<String, Option<String>>>,
    }

    impl LinkDir for MemDir {
        fn ensure_link(
            &self,
            target: &str,
            name: &str,
            overwrite: bool,
        ) -> Result<LinkOutcome, LinkError> {
            let mut entries = self.entries.borrow_mut();
            let outcome = match entries.get(name) {
                Some(None) => return Ok(LinkOutcome::OccupiedByFile),
                Some(Some(_)) if !overwrite => return Ok(LinkOutcome::AlreadyLink),
                Some(Some(_)) => LinkOutcome::Replaced,
                None => LinkOutcome::Created,
            };
            entries.insert(name.to_string(), Some(target.to_string()));
            Ok(outcome)
        }
    }

    /// Fails every link named `broken`, delegates the rest.
    struct FailingDir {
        inner: MemDir,
        broken: &'static str,
    }

    impl LinkDir for FailingDir {
        fn ensure_link(
            &self,
            target: &str,
            name: &str,
            overwrite: bool,
        ) -> Result<LinkOutcome, LinkError> {
            if name == self.broken {
                return Err(LinkError {
                    link: PathBuf::from(name),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
                });
            }
            self.inner.ensure_link(target, name, overwrite)
        }
    }

    fn vocab() -> VocabularyIndex {
        VocabularyIndex::from_words(["my", "file", "tree", "house", "treehouse"]).unwrap()
    }

    #[test]
    fn test_link_file_creates_all_aliases() {
        let vocab = vocab();
        let linker = Linker::new(Segmenter::new(&vocab), LinkOptions::default());
        let dir = MemDir::default();
        dir.entries
            .borrow_mut()
            .insert("Treehouse.PNG".to_string(), None);

        let mut report = LinkReport::default();
        linker.link_file(&dir, "Treehouse.PNG", &mut report).unwrap();

        let entries = dir.entries.borrow();
        assert_eq!(
            entries.get("treehouse.png"),
            Some(&Some("Treehouse.PNG".to_string()))
        );
        assert_eq!(
            entries.get("TreeHouse.PNG"),
            Some(&Some("Treehouse.PNG".to_string()))
        );
        // The file already carries this exact name.
        assert_eq!(entries.get("Treehouse.PNG"), Some(&None));
        assert_eq!(report.links_created, 2);
        assert_eq!(report.occupied, 1);
    }

    #[test]
    fn test_unsegmentable_file_is_recorded() {
        let vocab = vocab();
        let linker = Linker::new(Segmenter::new(&vocab), LinkOptions::default());
        let dir = MemDir::default();

        let mut report = LinkReport::default();
        linker.link_file(&dir, "zzzzzzzz.txt", &mut report).unwrap();

        assert_eq!(report.links_created, 1);
        assert_eq!(report.unsegmented, vec!["zzzzzzzz.txt"]);
        assert!(dir.entries.borrow().contains_key("zzzzzzzz.txt"));
    }

    #[test]
    fn test_existing_links_kept_without_overwrite() {
        let vocab = vocab();
        let options = LinkOptions {
            overwrite: false,
            ..Default::default()
        };
        let linker = Linker::new(Segmenter::new(&vocab), options);
        let dir = MemDir::default();
        dir.entries
            .borrow_mut()
            .insert("my_file.txt".to_string(), Some("elsewhere".to_string()));

        let mut report = LinkReport::default();
        linker.link_file(&dir, "MY_FILE.txt", &mut report).unwrap();

        assert_eq!(report.links_kept, 1);
        assert_eq!(report.links_created, 1);
        assert_eq!(
            dir.entries.borrow().get("my_file.txt"),
            Some(&Some("elsewhere".to_string()))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_walks_tree_and_skips_links() {
        use std::fs;
        use tempfile::tempdir;

        let vocab = vocab();
        let linker = Linker::new(Segmenter::new(&vocab), LinkOptions::default());
        let root = tempdir().unwrap();
        let nested = root.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(root.path().join("MY_FILE.txt"), "a").unwrap();
        fs::write(nested.join("treehouse"), "b").unwrap();
        std::os::unix::fs::symlink("MY_FILE.txt", root.path().join("Link_To_File")).unwrap();

        let report = linker.run(&[root.path().to_path_buf()]).unwrap();

        assert_eq!(report.files_seen, 2);
        assert!(report.failures.is_empty());
        assert_eq!(
            fs::read_link(root.path().join("my_file.txt")).unwrap(),
            PathBuf::from("MY_FILE.txt")
        );
        assert_eq!(
            fs::read_link(root.path().join("My_File.txt")).unwrap(),
            PathBuf::from("MY_FILE.txt")
        );
        assert_eq!(
            fs::read_link(nested.join("TreeHouse")).unwrap(),
            PathBuf::from("treehouse")
        );
        assert_eq!(
            fs::read_link(nested.join("Treehouse")).unwrap(),
            PathBuf::from("treehouse")
        );
        assert!(fs::symlink_metadata(root.path().join("link_to_file")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_is_idempotent() {
        use std::fs;
        use tempfile::tempdir;

        let vocab = vocab();
        let options = LinkOptions {
            overwrite: false,
            ..Default::default()
        };
        let linker = Linker::new(Segmenter::new(&vocab), options);
        let root = tempdir().unwrap();
        fs::write(root.path().join("My_File.txt"), "a").unwrap();

        let first = linker.run(&[root.path().to_path_buf()]).unwrap();
        assert_eq!(first.links_created, 1);
        assert_eq!(first.occupied, 1);

        let second = linker.run(&[root.path().to_path_buf()]).unwrap();
        assert_eq!(second.files_seen, 1);
        assert_eq!(second.links_created, 0);
        assert_eq!(second.links_kept, 1);
    }

    #[test]
    fn test_link_failure_aborts_by_default() {
        let vocab = vocab();
        let linker = Linker::new(Segmenter::new(&vocab), LinkOptions::default());
        let dir = FailingDir {
            inner: MemDir::default(),
            broken: "my_file.txt",
        };

        let mut report = LinkReport::default();
        let err = linker
            .link_entry(&dir, Path::new("data/MY_FILE.txt"), &mut report)
            .unwrap_err();

        assert_eq!(err.link, PathBuf::from("my_file.txt"));
        assert!(report.failures.is_empty());
        assert!(dir.inner.entries.borrow().is_empty());
    }

    #[test]
    fn test_link_failure_recorded_when_skipping() {
        let vocab = vocab();
        let options = LinkOptions {
            skip_errors: true,
            ..Default::default()
        };
        let linker = Linker::new(Segmenter::new(&vocab), options);
        let dir = FailingDir {
            inner: MemDir::default(),
            broken: "my_file.txt",
        };

        let mut report = LinkReport::default();
        linker
            .link_entry(&dir, Path::new("data/MY_FILE.txt"), &mut report)
            .unwrap();
        linker
            .link_entry(&dir, Path::new("data/treehouse.png"), &mut report)
            .unwrap();

        assert_eq!(report.files_seen, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("data/MY_FILE.txt"));
        assert!(report.failures[0].reason.contains("read-only"));

        let entries = dir.inner.entries.borrow();
        assert!(entries.contains_key("TreeHouse.png"));
        assert!(entries.contains_key("Treehouse.png"));
        assert!(report.has_problems());
    }

    #[cfg(unix)]
    #[test]
    fn test_replaced_directory_is_refused() {
        use std::fs;
        use tempfile::tempdir;

        let vocab = vocab();
        let linker = Linker::new(Segmenter::new(&vocab), LinkOptions::default());
        let root = tempdir().unwrap();
        let other = tempdir().unwrap();
        let dir = root.path().to_path_buf();

        let own = DirId::of(&fs::metadata(&dir).unwrap());
        let foreign = DirId::of(&fs::metadata(other.path()).unwrap());

        assert!(linker.open_dir(&dir, Some(&(dir.clone(), own))).is_ok());
        let err = linker
            .open_dir(&dir, Some(&(dir.clone(), foreign)))
            .err()
            .unwrap();
        assert!(err.to_string().contains("changed during the walk"));
        // A listing of another directory is not compared.
        assert!(linker
            .open_dir(&dir, Some(&(other.path().to_path_buf(), foreign)))
            .is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_root_is_not_walked() {
        use std::fs;
        use tempfile::tempdir;

        let vocab = vocab();
        let linker = Linker::new(Segmenter::new(&vocab), LinkOptions::default());
        let root = tempdir().unwrap();
        let real = root.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("MY_FILE.txt"), "a").unwrap();
        std::os::unix::fs::symlink("real", root.path().join("alias")).unwrap();

        let report = linker.run(&[root.path().join("alias")]).unwrap();

        assert_eq!(report.files_seen, 0);
        assert!(fs::symlink_metadata(real.join("my_file.txt")).is_err());
    }

    #[test]
    fn test_missing_root_aborts_unless_skipping() {
        let vocab = vocab();
        let missing = PathBuf::from("/nonexistent/caselink/root");

        let strict = Linker::new(Segmenter::new(&vocab), LinkOptions::default());
        assert!(matches!(strict.run(&[missing.clone()]), Err(RunError::Walk(_))));

        let lenient = Linker::new(
            Segmenter::new(&vocab),
            LinkOptions {
                skip_errors: true,
                ..Default::default()
            },
        );
        let report = lenient.run(&[missing]).unwrap();
        assert_eq!(report.failures.len(), 1);
    }
}

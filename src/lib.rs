#[cfg(not(unix))]
compile_error!("caselink links files through unix directory handles");

pub mod cli;
pub mod config;
pub mod linker;
pub mod segment;
pub mod vocab;

pub use config::Config;
pub use linker::{LinkOptions, Linker};
pub use segment::Segmenter;
pub use vocab::VocabularyIndex;

use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkReport {
    pub files_seen: usize,
    pub links_created: usize,
    pub links_replaced: usize,
    pub links_kept: usize,
    /// Alias names held by a regular file, the file itself included.
    pub occupied: usize,
    /// Files for which no CamelCase alias could be built.
    pub unsegmented: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl LinkReport {
    pub fn has_problems(&self) -> bool {
        !self.unsegmented.is_empty() || !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Aliases a single filename would receive.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub filename: String,
    pub lower: String,
    pub camel: Vec<String>,
    pub error: Option<String>,
}

impl Preview {
    pub fn of(filename: &str, segmenter: &Segmenter<'_>, limit: Option<usize>) -> Self {
        let (camel, error) =
            match segment::filename::camel_case_names_limited(filename, segmenter, limit) {
                Ok(names) => (names, None),
                Err(e) => (Vec::new(), Some(e.to_string())),
            };

        Self {
            filename: filename.to_string(),
            lower: segment::filename::lower_case_name(filename),
            camel,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        let vocab = VocabularyIndex::from_words(["my", "file"]).unwrap();
        let segmenter = Segmenter::new(&vocab);

        let preview = Preview::of("MY_FILE.txt", &segmenter, None);
        assert_eq!(preview.lower, "my_file.txt");
        assert_eq!(preview.camel, vec!["My_File.txt"]);
        assert!(preview.error.is_none());

        let preview = Preview::of("qqqqqqqq", &segmenter, None);
        assert!(preview.camel.is_empty());
        assert!(preview.error.unwrap().contains("qqqqqqqq"));
    }

    #[test]
    fn test_report_problems() {
        let mut report = LinkReport::default();
        assert!(!report.has_problems());
        report.unsegmented.push("zzzzzzzz".to_string());
        assert!(report.has_problems());
    }
}

use fst::{Set, SetBuilder, Streamer};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extension marking a pre-compiled vocabulary.
pub const COMPILED_EXTENSION: &str = "fst";

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("failed to read vocabulary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid vocabulary {path}: {source}")]
    Fst {
        path: PathBuf,
        #[source]
        source: fst::Error,
    },

    #[error("failed to build vocabulary: {0}")]
    Build(#[from] fst::Error),
}

/// Immutable set of lowercase words answering "which words start this string".
pub struct VocabularyIndex {
    set: Set<Vec<u8>>,
}

impl VocabularyIndex {
    /// Build an index from raw words. Each word is trimmed and lower-cased,
    /// blank entries are dropped and duplicates collapse.
    pub fn from_words<I, S>(words: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = Set::from_iter(normalize(words))?;
        Ok(Self { set })
    }

    /// Load a vocabulary from disk.
    ///
    /// Files ending in `.fst` are read as a compiled set (see
    /// [`VocabularyIndex::build_to_path`]); anything else is a plain word
    /// list with one word per line.
    pub fn load(path: &Path) -> Result<Self, VocabularyError> {
        let io_err = |source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        };

        if is_compiled(path) {
            let bytes = fs::read(path).map_err(io_err)?;
            let set = Set::new(bytes).map_err(|source| VocabularyError::Fst {
                path: path.to_path_buf(),
                source,
            })?;
            return Ok(Self { set });
        }

        let content = fs::read_to_string(path).map_err(io_err)?;
        Self::from_words(content.lines())
    }

    /// Compile a word list into an FST file that [`VocabularyIndex::load`] accepts.
    pub fn build_to_path<I, S>(words: I, output_path: &Path) -> Result<usize, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let io_err = |source| VocabularyError::Io {
            path: output_path.to_path_buf(),
            source,
        };

        let file = File::create(output_path).map_err(io_err)?;
        let mut builder = SetBuilder::new(BufWriter::new(file))?;

        let words = normalize(words);
        let count = words.len();
        for word in words {
            builder.insert(word.as_bytes())?;
        }
        builder.finish()?;

        Ok(count)
    }

    /// Every vocabulary word that is a prefix of `input`, `input` itself
    /// included when it is a member.
    ///
    /// Results come shortest first. Since all of them are prefixes of the
    /// same string this is also lexicographic order, and it fixes the order
    /// in which segmentations are enumerated.
    pub fn prefixes_of<'s>(&self, input: &'s str) -> Vec<&'s str> {
        let fst = self.set.as_fst();
        let mut node = fst.root();
        let mut prefixes = Vec::new();

        for (i, byte) in input.bytes().enumerate() {
            let Some(idx) = node.find_input(byte) else {
                break;
            };
            node = fst.node(node.transition_addr(idx));
            // Members are valid UTF-8, so a final state always sits on a
            // char boundary of `input`.
            if node.is_final() {
                prefixes.push(&input[..=i]);
            }
        }

        prefixes
    }

    pub fn contains(&self, word: &str) -> bool {
        self.set.contains(word.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// All words in lexicographic order.
    pub fn words(&self) -> Vec<String> {
        let mut words = Vec::with_capacity(self.len());
        let mut stream = self.set.stream();

        while let Some(key) = stream.next() {
            if let Ok(word) = String::from_utf8(key.to_vec()) {
                words.push(word);
            }
        }

        words
    }
}

pub fn is_compiled(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(COMPILED_EXTENSION)
}

fn normalize<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut words: Vec<String> = words
        .into_iter()
        .map(|w| w.as_ref().trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    words.sort();
    words.dedup();
    words
}

pub mod filename;

use crate::vocab::VocabularyIndex;

/// Residuals shorter than this are title-cased whole instead of being split.
pub const MIN_WORD_LEN: usize = 4;

/// Splits lowercase name chunks into CamelCase candidates using a vocabulary.
#[derive(Clone, Copy)]
pub struct Segmenter<'v> {
    vocab: &'v VocabularyIndex,
    min_word_len: usize,
}

impl<'v> Segmenter<'v> {
    pub fn new(vocab: &'v VocabularyIndex) -> Self {
        Self {
            vocab,
            min_word_len: MIN_WORD_LEN,
        }
    }

    pub fn with_min_word_len(mut self, min_word_len: usize) -> Self {
        self.min_word_len = min_word_len;
        self
    }

    /// Enumerate every segmentation of `chunk`.
    ///
    /// A leading digit run is kept verbatim. What follows is either
    /// title-cased whole (when shorter than the minimum word length) or split
    /// at every vocabulary prefix, recursing into the tail. Branches whose
    /// tail cannot be split yield nothing, so the sequence may be empty.
    ///
    /// The iterator is lazy: taking the first `n` items only does the work
    /// needed for them.
    pub fn segment<'c>(&self, chunk: &'c str) -> Segments<'v, 'c> {
        Segments {
            vocab: self.vocab,
            min_word_len: self.min_word_len,
            pending: Some(chunk),
            stack: Vec::new(),
            buf: String::new(),
        }
    }
}

struct Frame<'c> {
    /// Length of the output buffer before this level's word is appended.
    mark: usize,
    rest: &'c str,
    prefixes: std::vec::IntoIter<&'c str>,
}

/// Lazy sequence of CamelCase candidates for one chunk.
///
/// Each stack frame stands for one recursion level of the split; `buf`
/// holds the candidate built along the current path.
pub struct Segments<'v, 'c> {
    vocab: &'v VocabularyIndex,
    min_word_len: usize,
    pending: Option<&'c str>,
    stack: Vec<Frame<'c>>,
    buf: String,
}

impl<'c> Segments<'_, 'c> {
    /// Start on `chunk` at the end of `buf`. Returns a candidate when the
    /// chunk ends in a terminal case, otherwise pushes a frame.
    fn enter(&mut self, chunk: &'c str) -> Option<String> {
        if chunk.is_empty() {
            return Some(self.buf.clone());
        }

        let (digits, rest) = split_leading_digits(chunk);
        self.buf.push_str(digits);

        if rest.chars().count() < self.min_word_len {
            self.buf.push_str(&title_case(rest));
            return Some(self.buf.clone());
        }

        self.stack.push(Frame {
            mark: self.buf.len(),
            rest,
            prefixes: self.vocab.prefixes_of(rest).into_iter(),
        });
        None
    }
}

impl Iterator for Segments<'_, '_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(chunk) = self.pending.take() {
                if let Some(candidate) = self.enter(chunk) {
                    return Some(candidate);
                }
                continue;
            }

            let frame = self.stack.last_mut()?;
            match frame.prefixes.next() {
                Some(prefix) => {
                    self.buf.truncate(frame.mark);
                    self.buf.push_str(&title_case(prefix));
                    self.pending = Some(&frame.rest[prefix.len()..]);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Split off the maximal run of leading ASCII digits.
pub fn split_leading_digits(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Upper-case the first alphabetic character, lower-case everything else.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalized = false;

    for ch in s.chars() {
        if !capitalized && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            capitalized = true;
        } else {
            out.extend(ch.to_lowercase());
        }
    }

    out
}

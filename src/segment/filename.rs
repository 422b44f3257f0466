use super::Segmenter;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentationError {
    #[error("cannot convert {filename} to CamelCase; add the missing words to the vocabulary")]
    Exhausted { filename: String },
}

/// The lowercase alias of a filename.
pub fn lower_case_name(filename: &str) -> String {
    filename.to_lowercase()
}

/// Every CamelCase alias of `filename`.
///
/// Only the last `.` separates the extension, which is kept verbatim. The
/// base is lower-cased, split on `_`, and each chunk segmented; the aliases
/// are the Cartesian product of the chunk candidates joined with `_`.
pub fn camel_case_names(
    filename: &str,
    segmenter: &Segmenter<'_>,
) -> Result<Vec<String>, SegmentationError> {
    camel_case_names_limited(filename, segmenter, None)
}

/// Like [`camel_case_names`] but stops after `limit` aliases.
///
/// A limit of zero asks for nothing and is not a segmentation failure.
pub fn camel_case_names_limited(
    filename: &str,
    segmenter: &Segmenter<'_>,
    limit: Option<usize>,
) -> Result<Vec<String>, SegmentationError> {
    if limit == Some(0) {
        return Ok(Vec::new());
    }

    let (base, extension) = match filename.rsplit_once('.') {
        Some((base, ext)) => (base, Some(ext)),
        None => (filename, None),
    };

    let base = base.to_lowercase();
    // A product element at index k never uses a candidate past index k, so
    // each chunk only needs its first `limit` candidates.
    let per_chunk = limit.unwrap_or(usize::MAX);
    let variants: Vec<Vec<String>> = base
        .split('_')
        .map(|chunk| segmenter.segment(chunk).take(per_chunk).collect())
        .collect();

    let names: Vec<String> = product(&variants, limit)
        .into_iter()
        .map(|name| match extension {
            Some(ext) => format!("{}.{}", name, ext),
            None => name,
        })
        .collect();

    if names.is_empty() {
        return Err(SegmentationError::Exhausted {
            filename: filename.to_string(),
        });
    }

    Ok(names)
}

/// Cartesian product of `lists`, each tuple joined with `_`. The last list
/// varies fastest.
fn product(lists: &[Vec<String>], limit: Option<usize>) -> Vec<String> {
    if lists.is_empty() || lists.iter().any(Vec::is_empty) {
        return Vec::new();
    }

    let mut indices = vec![0; lists.len()];
    let mut out = Vec::new();

    loop {
        if limit.is_some_and(|limit| out.len() >= limit) {
            return out;
        }

        let parts: Vec<&str> = indices
            .iter()
            .zip(lists)
            .map(|(&i, list)| list[i].as_str())
            .collect();
        out.push(parts.join("_"));

        // odometer step
        let mut pos = lists.len();
        loop {
            if pos == 0 {
                return out;
            }
            pos -= 1;
            indices[pos] += 1;
            if indices[pos] < lists[pos].len() {
                break;
            }
            indices[pos] = 0;
        }
    }
}

pub mod index;
pub mod manager;

pub use index::{VocabularyError, VocabularyIndex};

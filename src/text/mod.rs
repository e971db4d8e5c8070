// Text normalization and tokenization.
//
// Every analysis works from the same canonical text: lower-cased, stripped
// of punctuation and markdown syntax, stop words removed. Both functions are
// pure, so anything derived from their output can be cached safely.

pub mod normalize;
pub mod stopwords;

pub use normalize::{normalize, tokenize, Tokenizer};

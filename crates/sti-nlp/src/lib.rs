#![deny(unsafe_code)]

//! Text processing shared by the interpretation engine.
//!
//! Everything the scorers compare is reduced to a [`Bow`] (weighted bag of
//! words) and compared with [`dice`]. Tokenizing, stop-word removal and
//! lemmatization are bundled in [`TextProcessor`].

pub mod bow;
pub mod error;
pub mod lemma;
pub mod pos;
pub mod processor;
pub mod shape;
pub mod stopwords;
pub mod tokenize;

pub use bow::{Bow, dice};
pub use error::NlpError;
pub use lemma::Lemmatizer;
pub use pos::ends_with_preposition;
pub use processor::TextProcessor;
pub use shape::{first_sentence, looks_like_acronym};
pub use stopwords::StopWords;
pub use tokenize::{normalize_text, split_camel_case, tokenize, uri_local_name};

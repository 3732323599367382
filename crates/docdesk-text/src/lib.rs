pub mod classify;
pub mod highlight;
pub mod synonyms;
pub mod tokenize;

pub use classify::classify;
pub use highlight::{Highlighter, Matcher, Render, Segment};
pub use synonyms::SynonymTable;
pub use tokenize::{tokenize, QueryTerms};

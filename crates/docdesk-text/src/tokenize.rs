use crate::synonyms::SynonymTable;

/// Punctuation that separates query tokens, in addition to whitespace.
const SEPARATORS: &[char] = &[
    ',', '.', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '"', '\'', '`', '/', '\\', '|', '-', '_', '+', '=', '*', '&', '^', '%', '$', '#', '@', '~', '<', '>',
];

fn is_separator(c: char) -> bool { c.is_whitespace() || SEPARATORS.contains(&c) }

/// Lowercase, split on separators, drop tokens shorter than two characters,
/// dedupe keeping first-seen order.
pub fn tokenize(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();
    let mut out: Vec<String> = Vec::new();
    for tok in lowered.split(is_separator) {
        if tok.chars().count() < 2 || out.iter().any(|t| t == tok) { continue; }
        out.push(tok.to_string());
    }
    out
}

/// Tokens of a query plus the synonyms they expand to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    pub tokens: Vec<String>,
    /// Not deduplicated against `tokens`.
    pub synonym_tokens: Vec<String>,
}

impl QueryTerms {
    pub fn parse(query: &str, table: &SynonymTable) -> Self {
        let tokens = tokenize(query);
        let synonym_tokens = tokens.iter().filter_map(|t| table.lookup(t)).flatten().cloned().collect();
        Self { tokens, synonym_tokens }
    }

    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }
}

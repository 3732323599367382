use docdesk_core::types::HitKind;

use crate::highlight::Matcher;

/// Kind of a passage with respect to the query.
///
/// Keyword when a query token occurs in `text`; otherwise synonym when
/// synonyms are enabled and one occurs; otherwise semantic. Only the text is
/// consulted, so the result does not depend on which endpoint produced the
/// passage.
pub fn classify(text: &str, keyword: &Matcher, synonym: &Matcher, synonyms_enabled: bool) -> HitKind {
    if keyword.is_match(text) {
        HitKind::Keyword
    } else if synonyms_enabled && synonym.is_match(text) {
        HitKind::Synonym
    } else {
        HitKind::Semantic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_synonyms_fall_through_to_semantic() {
        let kw = Matcher::compile(&["subsidy"]).unwrap();
        let syn = Matcher::compile(&["grant"]).unwrap();
        assert_eq!(classify("a grant", &kw, &syn, true), HitKind::Synonym);
        assert_eq!(classify("a grant", &kw, &syn, false), HitKind::Semantic);
        assert_eq!(classify("a SUBSIDY grant", &kw, &syn, false), HitKind::Keyword);
    }
}

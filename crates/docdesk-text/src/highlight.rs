//! Query highlighting.
//!
//! Tokens compile into one case-insensitive alternation. Highlighting runs in
//! two passes: keyword matches first, then synonym matches only inside the
//! text the first pass left plain. Concatenating the segments always yields
//! the input text.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use docdesk_core::error::{Error, Result};
use docdesk_core::types::HitKind;

use crate::classify::classify;
use crate::tokenize::QueryTerms;

/// A compiled token alternation. Empty token sets never match.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    regex: Option<Regex>,
}

impl Matcher {
    pub fn none() -> Self { Self::default() }

    pub fn compile<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let mut alts: Vec<&str> = tokens.iter().map(AsRef::as_ref).filter(|t| !t.is_empty()).collect();
        if alts.is_empty() { return Ok(Self::none()); }
        // Longest first so "subsidies" wins over "subsidy" at the same offset.
        alts.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));
        alts.dedup();
        let pattern = alts.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Operation(format!("highlight pattern: {e}")))?;
        debug!(alternatives = alts.len(), "compiled highlight pattern");
        Ok(Self { regex: Some(regex) })
    }

    pub fn is_empty(&self) -> bool { self.regex.is_none() }

    pub fn is_match(&self, text: &str) -> bool { self.regex.as_ref().is_some_and(|r| r.is_match(text)) }

    fn ranges(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex.as_ref().map(|r| r.find_iter(text).map(|m| (m.start(), m.end())).collect()).unwrap_or_default()
    }
}

/// A slice of highlighted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Keyword(&'a str),
    Synonym(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match *self { Self::Plain(s) | Self::Keyword(s) | Self::Synonym(s) => s }
    }
}

/// Split `text` into plain, keyword and synonym segments.
pub fn segments<'a>(text: &'a str, keyword: &Matcher, synonym: &Matcher) -> Vec<Segment<'a>> {
    let mut out = Vec::new();
    let mut last = 0;
    for (start, end) in keyword.ranges(text) {
        push_plain(&mut out, &text[last..start], synonym);
        out.push(Segment::Keyword(&text[start..end]));
        last = end;
    }
    push_plain(&mut out, &text[last..], synonym);
    out
}

fn push_plain<'a>(out: &mut Vec<Segment<'a>>, plain: &'a str, synonym: &Matcher) {
    let mut last = 0;
    for (start, end) in synonym.ranges(plain) {
        if start > last { out.push(Segment::Plain(&plain[last..start])); }
        out.push(Segment::Synonym(&plain[start..end]));
        last = end;
    }
    if last < plain.len() { out.push(Segment::Plain(&plain[last..])); }
}

/// Output flavours for highlighted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    /// Bold keywords, underlined synonyms.
    Ansi,
    /// `**keyword**` and `__synonym__`.
    Marked,
    /// `<mark class="kw">` / `<mark class="syn">` around escaped text.
    Html,
}

impl Render {
    pub fn render(self, segments: &[Segment<'_>]) -> String {
        let mut out = String::new();
        for seg in segments {
            match (self, seg) {
                (Self::Ansi, Segment::Keyword(s)) => { out.push_str("\x1b[1m"); out.push_str(s); out.push_str("\x1b[0m"); }
                (Self::Ansi, Segment::Synonym(s)) => { out.push_str("\x1b[4m"); out.push_str(s); out.push_str("\x1b[0m"); }
                (Self::Marked, Segment::Keyword(s)) => { out.push_str("**"); out.push_str(s); out.push_str("**"); }
                (Self::Marked, Segment::Synonym(s)) => { out.push_str("__"); out.push_str(s); out.push_str("__"); }
                (Self::Html, Segment::Keyword(s)) => { out.push_str("<mark class=\"kw\">"); out.push_str(&escape_html(s)); out.push_str("</mark>"); }
                (Self::Html, Segment::Synonym(s)) => { out.push_str("<mark class=\"syn\">"); out.push_str(&escape_html(s)); out.push_str("</mark>"); }
                (Self::Html, Segment::Plain(s)) => out.push_str(&escape_html(s)),
                (_, Segment::Plain(s)) => out.push_str(s),
            }
        }
        out
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;").replace('\'', "&#39;")
}

/// Both patterns of one query, ready to highlight and classify passages.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    keyword: Matcher,
    synonym: Matcher,
    synonyms_enabled: bool,
}

impl Highlighter {
    pub fn new(terms: &QueryTerms, synonyms_enabled: bool) -> Result<Self> {
        let keyword = Matcher::compile(terms.tokens.as_slice())?;
        let synonym = if synonyms_enabled { Matcher::compile(terms.synonym_tokens.as_slice())? } else { Matcher::none() };
        Ok(Self { keyword, synonym, synonyms_enabled })
    }

    pub fn keyword(&self) -> &Matcher { &self.keyword }

    pub fn synonym(&self) -> &Matcher { &self.synonym }

    /// Whether `text` matches a token or an enabled synonym.
    pub fn matches_text(&self, text: &str) -> bool {
        self.keyword.is_match(text) || (self.synonyms_enabled && self.synonym.is_match(text))
    }

    pub fn classify(&self, text: &str) -> HitKind { classify(text, &self.keyword, &self.synonym, self.synonyms_enabled) }

    pub fn segments<'a>(&self, text: &'a str) -> Vec<Segment<'a>> { segments(text, &self.keyword, &self.synonym) }

    pub fn render(&self, text: &str, style: Render) -> String { style.render(&self.segments(text)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(tokens: &[&str]) -> Matcher { Matcher::compile(tokens).unwrap() }

    #[test]
    fn empty_token_set_never_matches() {
        let none = m(&[]);
        assert!(none.is_empty());
        assert!(!none.is_match("anything"));
        assert_eq!(segments("plain text", &none, &none), vec![Segment::Plain("plain text")]);
    }

    #[test]
    fn escapes_metacharacters() {
        let mm = m(&["c++", "(a)"]);
        assert!(mm.is_match("we use C++ here"));
        assert!(!mm.is_match("we use c here"));
    }

    #[test]
    fn keyword_wins_over_synonym() {
        let kw = m(&["grant"]);
        let syn = m(&["grant", "aid"]);
        let segs = segments("Grant and aid", &kw, &syn);
        assert_eq!(segs, vec![Segment::Keyword("Grant"), Segment::Plain(" and "), Segment::Synonym("aid")]);
    }

    #[test]
    fn synonym_pass_never_reaches_inside_keyword_spans() {
        // The "sub" inside "subsidy" stays part of the keyword span.
        let segs = segments("subsidy x sub", &m(&["subsidy"]), &m(&["sub"]));
        assert_eq!(segs, vec![Segment::Keyword("subsidy"), Segment::Plain(" x "), Segment::Synonym("sub")]);
    }

    #[test]
    fn longer_alternative_preferred() {
        let segs = segments("subsidies", &m(&["subsidi", "subsidies"]), &Matcher::none());
        assert_eq!(segs, vec![Segment::Keyword("subsidies")]);
    }

    #[test]
    fn renders_each_flavour() {
        let segs = segments("a <grant> & subsidy", &m(&["subsidy"]), &m(&["grant"]));
        assert_eq!(Render::Marked.render(&segs), "a <__grant__> & **subsidy**");
        assert_eq!(Render::Html.render(&segs), "a &lt;<mark class=\"syn\">grant</mark>&gt; &amp; <mark class=\"kw\">subsidy</mark>");
        assert_eq!(Render::Ansi.render(&segs), "a <\x1b[4mgrant\x1b[0m> & \x1b[1msubsidy\x1b[0m");
    }
}

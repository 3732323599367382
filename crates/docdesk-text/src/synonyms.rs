use std::collections::BTreeMap;

use docdesk_core::settings::Settings;

/// Built-in canonical -> synonyms table (English with transliterated Hindi).
const BUILTIN: &[(&str, &[&str])] = &[
    ("subsidy", &["grant", "assistance"]),
    ("farmer", &["kisan", "cultivator", "grower"]),
    ("leave", &["vacation", "holiday", "absence", "chhutti"]),
    ("salary", &["pay", "wages", "compensation", "vetan"]),
    ("employee", &["staff", "worker", "karmachari"]),
    ("policy", &["rule", "guideline", "niti"]),
    ("pension", &["retirement", "superannuation"]),
    ("loan", &["credit", "advance", "rin"]),
    ("insurance", &["cover", "bima"]),
    ("training", &["course", "workshop", "prashikshan"]),
    ("transfer", &["relocation", "posting", "tabadla"]),
    ("allowance", &["stipend", "bhatta"]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    map: BTreeMap<String, Vec<String>>,
}

impl Default for SynonymTable {
    fn default() -> Self { Self::builtin() }
}

impl SynonymTable {
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN.iter().map(|(k, vs)| (*k, vs.iter().copied())))
    }

    /// Keys and synonyms are lowercased; blank synonyms are dropped.
    pub fn from_pairs<K, I, S>(pairs: impl IntoIterator<Item = (K, I)>) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (k, vs) in pairs {
            let key = k.as_ref().trim().to_lowercase();
            if key.is_empty() { continue; }
            let entry = map.entry(key).or_default();
            entry.extend(vs.into_iter().map(|s| s.as_ref().trim().to_lowercase()).filter(|s| !s.is_empty()));
        }
        Self { map }
    }

    /// Operator table from settings, or the built-in one when none is set.
    pub fn from_settings(settings: &Settings) -> Self {
        if settings.synonyms.is_empty() { return Self::builtin(); }
        Self::from_pairs(settings.synonyms.iter().map(|(k, v)| (k.as_str(), v.iter())))
    }

    pub fn lookup(&self, token: &str) -> Option<&[String]> { self.map.get(token).map(Vec::as_slice) }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }
}

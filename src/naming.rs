//! Canonical identifiers from free-text archetype labels.
//!
//! `"/_state structure/*_confounding factors(en)_ELEMENT"` becomes
//! `ConfoundingFactorsEnElement`: the last path segment is kept, bracketed
//! qualifiers are dropped, diacritics are transliterated and every run of
//! non-alphanumeric characters separates words.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static QUALIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("qualifier pattern is a valid regex"));

pub fn resolve_class_name(raw: &str) -> String {
    let name: String = words(raw).iter().map(|w| capitalize(w)).collect();
    finish(name, "Unnamed")
}

pub fn resolve_field_name(raw: &str) -> String {
    let name: String = words(raw)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
        .collect();
    finish(name, "unnamed")
}

pub fn resolve_constant_name(raw: &str) -> String {
    let name = words(raw)
        .iter()
        .map(|w| w.to_uppercase())
        .collect::<Vec<_>>()
        .join("_");
    finish(name, "UNNAMED")
}

/// Lowercased ASCII words of the most specific segment of `raw`.
pub fn words(raw: &str) -> Vec<String> {
    let stripped = QUALIFIER.replace_all(raw, "");
    let segment = stripped
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .next_back()
        .unwrap_or_default();

    transliterate(segment)
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

fn finish(name: String, empty: &str) -> String {
    if name.is_empty() {
        empty.to_string()
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{name}")
    } else {
        name
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            'ä' => out.push_str("ae"),
            'Ä' => out.push_str("Ae"),
            'ö' => out.push_str("oe"),
            'Ö' => out.push_str("Oe"),
            'ü' => out.push_str("ue"),
            'Ü' => out.push_str("Ue"),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("Ae"),
            'à' | 'á' | 'â' | 'ã' | 'å' => out.push('a'),
            'À' | 'Á' | 'Â' | 'Ã' | 'Å' => out.push('A'),
            'ç' => out.push('c'),
            'Ç' => out.push('C'),
            'è' | 'é' | 'ê' | 'ë' => out.push('e'),
            'È' | 'É' | 'Ê' | 'Ë' => out.push('E'),
            'ì' | 'í' | 'î' | 'ï' => out.push('i'),
            'Ì' | 'Í' | 'Î' | 'Ï' => out.push('I'),
            'ñ' => out.push('n'),
            'Ñ' => out.push('N'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ø' => out.push('o'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ø' => out.push('O'),
            'ù' | 'ú' | 'û' => out.push('u'),
            'Ù' | 'Ú' | 'Û' => out.push('U'),
            'ý' | 'ÿ' => out.push('y'),
            'Ý' => out.push('Y'),
            other => out.push(other),
        }
    }
    out
}

/// Set of names claimed so far; later claims of a taken name get `2`, `3`, ...
#[derive(Debug, Clone, Default)]
pub struct NameScope {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }

        let next = self.next_suffix.entry(base.to_string()).or_insert(2);
        loop {
            let candidate = format!("{base}{next}");
            *next += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}

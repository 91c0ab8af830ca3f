// src/extract/cleaner.rs
// =============================================================================
// Text normalization applied to extracted body text.
//
// The stages always run in this order:
// 1. Unicode canonical composition (NFC)
// 2. HTML entity decoding, with non-breaking spaces turned into plain spaces.
//    Legacy entities written without the trailing semicolon (`&copy 2024`,
//    `&nbspx`) are decoded too, the way browsers do.
// 3. Boilerplate removal (configured regexes, case-insensitive, in order)
// 4. Whitespace normalization (collapse runs, squeeze blank lines, trim)
//
// Every stage maps empty input to empty output.
// =============================================================================

use crate::error::{HarvestError, Result};
use html_escape::decode_html_entities;
use regex::{Captures, Regex, RegexBuilder};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static HORIZONTAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("valid regex"));

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[A-Za-z][A-Za-z0-9]{0,31};?)")
        .expect("valid regex")
});

// Named references that HTML still honours without a closing `;`
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    boilerplate: Vec<Regex>,
}

impl Cleaner {
    /// Compiles the boilerplate rules. An invalid pattern is a config error.
    pub fn new<S: AsRef<str>>(boilerplate_rules: &[S]) -> Result<Self> {
        let boilerplate = boilerplate_rules
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| HarvestError::InvalidPattern {
                        pattern: pattern.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { boilerplate })
    }

    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let text = normalize_unicode(text);
        let text = remove_html_artifacts(&text);
        let text = self.remove_boilerplate(text);
        normalize_whitespace(&text)
    }

    fn remove_boilerplate(&self, text: String) -> String {
        self.boilerplate.iter().fold(text, |acc, rule| {
            rule.replace_all(&acc, "").into_owned()
        })
    }
}

fn normalize_unicode(text: &str) -> String {
    text.nfc().collect()
}

fn remove_html_artifacts(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| decode_entity(&caps[0], &caps[1]))
        .replace('\u{a0}', " ")
}

// One pass over the input, so `&amp;copy` becomes `&copy` and stays that way
fn decode_entity(whole: &str, body: &str) -> String {
    if body.ends_with(';') {
        let decoded = decode_html_entities(whole);
        if decoded != whole {
            return decoded.into_owned();
        }
    } else if body.starts_with('#') {
        let terminated = format!("{whole};");
        let decoded = decode_html_entities(&terminated);
        if decoded != terminated {
            return decoded.into_owned();
        }
        return whole.to_string();
    }

    // Longest legacy name at the start wins; the rest is kept as text
    for end in (2..=body.len()).rev() {
        let name = &body[..end];
        if LEGACY_ENTITIES.contains(&name) {
            let decoded = decode_html_entities(&format!("&{name};")).into_owned();
            return decoded + &body[end..];
        }
    }
    whole.to_string()
}

fn normalize_whitespace(text: &str) -> String {
    let text = HORIZONTAL_RUN.replace_all(text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

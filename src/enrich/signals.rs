// src/enrich/signals.rs
// =============================================================================
// Pure text and URL signals computed for each record.
// =============================================================================

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid regex"));

static QUESTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(what|why|how|when|where|who|which|can|does|do)\b").expect("valid regex")
});

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "because",
    "been", "before", "being", "below", "between", "both", "but", "can", "could", "did", "does",
    "doing", "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
    "having", "her", "here", "hers", "herself", "him", "himself", "his", "how", "into", "its",
    "itself", "just", "may", "more", "most", "much", "must", "not", "now", "off", "once", "only",
    "other", "our", "ours", "out", "over", "own", "same", "she", "should", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "then", "there", "these", "they", "this", "those",
    "through", "too", "under", "until", "usually", "very", "was", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

/// Coarse length bucket by word count.
pub fn text_length_bin(word_count: usize) -> &'static str {
    match word_count {
        0..=99 => "short",
        100..=499 => "medium",
        500..=1999 => "long",
        _ => "very_long",
    }
}

// 0.4 * avg sentence length + 0.4 * avg word length + 0.2 * repeated-line ratio
// Higher means harder to read.
pub fn readability(text: &str) -> f64 {
    let words: Vec<&str> = WORD.find_iter(text).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return 0.0;
    }

    let word_count = words.len() as f64;
    let avg_word_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / word_count;
    let avg_sentence_len = word_count / sentence_count(text) as f64;
    let score = 0.4 * avg_sentence_len + 0.4 * avg_word_len + 0.2 * redundancy_penalty(text);

    (score * 1000.0).round() / 1000.0
}

fn sentence_count(text: &str) -> usize {
    SENTENCE_END
        .split(text)
        .filter(|part| !part.trim().is_empty())
        .count()
        .max(1)
}

// Fraction of non-empty lines that repeat an earlier line
fn redundancy_penalty(text: &str) -> f64 {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &line in &lines {
        *counts.entry(line).or_default() += 1;
    }
    let repeats: usize = counts.values().map(|n| n - 1).sum();
    repeats as f64 / lines.len() as f64
}

/// Registrable domain of the URL's host, or an empty string if it has none.
///
/// Only ICANN suffixes count: `user.github.io` maps to `github.io`, not to
/// itself. IP hosts are returned unchanged.
pub fn source_domain(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return String::new();
    };
    let Some(host) = parsed.host_str() else {
        return String::new();
    };
    if parsed.domain().is_none() {
        // IP address
        return host.to_string();
    }

    let host = host.trim_end_matches('.');
    let labels: Vec<&str> = host.split('.').collect();
    let suffix_labels = icann_suffix_labels(host).unwrap_or(1);
    let keep = (suffix_labels + 1).min(labels.len());
    labels[labels.len() - keep..].join(".")
}

// Label count of the ICANN public suffix ending `host`. Private entries
// (github.io, blogspot.com) are peeled off until an ICANN rule is left.
fn icann_suffix_labels(host: &str) -> Option<usize> {
    let mut name = host;
    loop {
        let suffix = psl::suffix(name.as_bytes())?;
        let text = std::str::from_utf8(suffix.as_bytes()).ok()?;
        if suffix.typ() != Some(psl::Type::Private) {
            return Some(text.split('.').count());
        }
        name = text.split_once('.')?.1;
    }
}

/// ISO 639-1 code of the text's language, `en` when unsure.
pub fn language(text: &str) -> String {
    const DEFAULT: &str = "en";
    if text.chars().count() <= 25 {
        return DEFAULT.to_string();
    }

    match whatlang::detect(text) {
        Some(info) => iso639_1(info.lang().code()).to_string(),
        None => DEFAULT.to_string(),
    }
}

// whatlang reports ISO 639-3; fall back to that code when there is no
// two-letter equivalent in this table
fn iso639_1(code: &str) -> &str {
    match code {
        "eng" => "en",
        "fra" => "fr",
        "deu" => "de",
        "spa" => "es",
        "ita" => "it",
        "por" => "pt",
        "nld" => "nl",
        "rus" => "ru",
        "ukr" => "uk",
        "pol" => "pl",
        "ces" => "cs",
        "swe" => "sv",
        "dan" => "da",
        "nob" => "no",
        "fin" => "fi",
        "tur" => "tr",
        "ell" => "el",
        "hun" => "hu",
        "ron" => "ro",
        "ara" => "ar",
        "heb" => "he",
        "hin" => "hi",
        "ben" => "bn",
        "jpn" => "ja",
        "kor" => "ko",
        "cmn" => "zh",
        "vie" => "vi",
        "tha" => "th",
        "ind" => "id",
        other => other,
    }
}

// Most frequent content words, ties broken by first appearance
pub fn keywords(text: &str, top_k: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, word) in WORD.find_iter(text).enumerate() {
        let word = word.as_str().to_lowercase();
        if word.chars().count() < 3
            || word.chars().all(|c| c.is_numeric() || c == '_')
            || STOPWORDS.contains(&word.as_str())
        {
            continue;
        }
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });
    ranked.into_iter().take(top_k).map(|(word, _)| word).collect()
}

/// Whitespace-collapsed description (or body), cut to `max_chars`.
pub fn summary(description: Option<&str>, body: &str, max_chars: usize) -> String {
    let source = description.filter(|d| !d.is_empty()).unwrap_or(body);
    let collapsed = source.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut summary: String = collapsed.chars().take(max_chars).collect();
    summary.truncate(summary.trim_end().len());
    if collapsed.chars().count() > max_chars {
        summary.push_str("...");
    }
    summary
}

/// Lines that read as questions, at most `max` of them.
pub fn questions(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.ends_with('?') && QUESTION_START.is_match(line))
        .take(max)
        .map(str::to_string)
        .collect()
}

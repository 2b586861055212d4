//! Text normalisation shared by the classifier, keyword extraction and entity extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

use crate::segments::{capitalized_runs, segment_sentences};

pub const DEFAULT_KEYWORDS: usize = 8;
pub const MAX_ENTITIES: usize = 10;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www\S+").expect("static regex compiles"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("static regex compiles"));
static NON_ALPHA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z\s]").expect("static regex compiles"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex compiles"));

const STOPWORDS_EN: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've", "you'll",
    "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself", "she", "she's",
    "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them", "their", "theirs",
    "themselves", "what", "which", "who", "whom", "this", "that", "that'll", "these", "those", "am",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having", "do", "does",
    "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as", "until", "while",
    "of", "at", "by", "for", "with", "about", "against", "between", "into", "through", "during",
    "before", "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only",
    "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don", "don't",
    "should", "should've", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't",
    "couldn", "couldn't", "didn", "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't",
    "haven", "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn",
    "needn't", "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won",
    "won't", "wouldn", "wouldn't",
];

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS_EN.iter().copied().collect());

static IRREGULAR_PLURALS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("men", "man"),
        ("women", "woman"),
        ("children", "child"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("lives", "life"),
        ("wives", "wife"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("halves", "half"),
        ("thieves", "thief"),
        ("criteria", "criterion"),
        ("phenomena", "phenomenon"),
        // `-ie` nouns the `-ies` rule would turn into `-y`
        ("movies", "movie"),
        ("cookies", "cookie"),
        ("calories", "calorie"),
        ("selfies", "selfie"),
        ("zombies", "zombie"),
        ("rookies", "rookie"),
        ("brownies", "brownie"),
        ("smoothies", "smoothie"),
        ("freebies", "freebie"),
        ("prairies", "prairie"),
        ("sorties", "sortie"),
        ("goalies", "goalie"),
        ("hippies", "hippie"),
        ("aunties", "auntie"),
    ]
    .into_iter()
    .collect()
});

// Nouns that end in `s` in their base form.
const INVARIANT_NOUNS: &[&str] = &[
    "news", "series", "species", "means", "politics", "economics", "physics", "mathematics", "ethics",
    "athletics", "gas", "bias", "atlas", "canvas", "alias", "lens", "chaos", "aids", "diabetes",
    "measles", "always", "perhaps", "across", "towards", "afterwards",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Lower-cases and strips URLs, markup and everything that is not an ASCII letter.
pub fn clean_text(text: &str) -> String {
    let text = text.to_lowercase();
    let text = URL_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = NON_ALPHA_RE.replace_all(&text, " ");
    WS_RE.replace_all(&text, " ").trim().to_string()
}

/// Noun lemma by suffix rules plus a small table of irregular forms.
pub fn lemmatize(word: &str) -> String {
    if let Some(base) = IRREGULAR_PLURALS.get(word) {
        return base.to_string();
    }
    if word.len() <= 3
        || INVARIANT_NOUNS.contains(&word)
        || word.ends_with("ss")
        || word.ends_with("us")
        || word.ends_with("is")
    {
        return word.to_string();
    }
    if word.len() > 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "ches", "shes", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) => stem.to_string(),
        None => word.to_string(),
    }
}

pub fn tokenize_and_lemmatize(cleaned: &str) -> Vec<String> {
    cleaned
        .unicode_words()
        .filter(|t| t.len() > 2 && !is_stopword(t))
        .map(lemmatize)
        .collect()
}

/// Cleaned, stopword-free, lemmatised text in the form the classifier was trained on.
pub fn preprocess_text(text: &str) -> String {
    tokenize_and_lemmatize(&clean_text(text)).join(" ")
}

/// Most frequent lemmas; ties keep first-appearance order.
pub fn extract_keywords(text: &str, top_k: usize) -> Vec<String> {
    let processed = preprocess_text(text);
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();
    for tok in processed.split_whitespace() {
        match slot.get(tok) {
            Some(&i) => counts[i].1 += 1,
            None => {
                slot.insert(tok, counts.len());
                counts.push((tok, 1));
            }
        }
    }
    // stable sort keeps insertion order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(top_k).map(|(w, _)| w.to_string()).collect()
}

/// Named-entity strings: capitalised word runs, de-duplicated case-insensitively, at most ten.
pub fn extract_entities(text: &str) -> Vec<String> {
    let compact = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for sentence in segment_sentences(&compact) {
        for entity in capitalized_runs(&sentence, |w| is_stopword(&w.to_lowercase())) {
            if seen.insert(entity.to_lowercase()) {
                out.push(entity);
            }
        }
    }
    out.truncate(MAX_ENTITIES);
    out
}

//! Lexical (TF-IDF cosine) similarity between the submitted text and candidate articles, and the
//! rule that merges it with the embedding score.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::types::SimilarityResult;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static regex compiles"));

// Lexical stop list, broader than the normaliser's: it also drops filler adverbs and numerals.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost",
    "alone", "along", "already", "also", "although", "always", "am", "among", "amongst", "amoungst",
    "amount", "an", "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere",
    "are", "around", "as", "at", "back", "be", "became", "because", "become", "becomes", "becoming",
    "been", "before", "beforehand", "behind", "being", "below", "beside", "besides", "between",
    "beyond", "bill", "both", "bottom", "but", "by", "call", "can", "cannot", "cant", "co", "con",
    "could", "couldnt", "cry", "de", "describe", "detail", "do", "done", "down", "due", "during",
    "each", "eg", "eight", "either", "eleven", "else", "elsewhere", "empty", "enough", "etc", "even",
    "ever", "every", "everyone", "everything", "everywhere", "except", "few", "fifteen", "fifty",
    "fill", "find", "fire", "first", "five", "for", "former", "formerly", "forty", "found", "four",
    "from", "front", "full", "further", "get", "give", "go", "had", "has", "hasnt", "have", "he",
    "hence", "her", "here", "hereafter", "hereby", "herein", "hereupon", "hers", "herself", "him",
    "himself", "his", "how", "however", "hundred", "i", "ie", "if", "in", "inc", "indeed", "interest",
    "into", "is", "it", "its", "itself", "keep", "last", "latter", "latterly", "least", "less", "ltd",
    "made", "many", "may", "me", "meanwhile", "might", "mill", "mine", "more", "moreover", "most",
    "mostly", "move", "much", "must", "my", "myself", "name", "namely", "neither", "never",
    "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not", "nothing", "now",
    "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other", "others",
    "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps", "please",
    "put", "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious", "several",
    "she", "should", "show", "side", "since", "sincere", "six", "sixty", "so", "some", "somehow",
    "someone", "something", "sometime", "sometimes", "somewhere", "still", "such", "system", "take",
    "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence", "there",
    "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus", "to",
    "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until",
    "up", "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when",
    "whence", "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon",
    "wherever", "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose",
    "why", "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

static LEXICAL_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

fn analyze(doc: &str) -> Vec<String> {
    let lower = doc.to_lowercase();
    TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !LEXICAL_STOPWORDS.contains(*t))
        .map(str::to_string)
        .collect()
}

type TermVector = HashMap<String, f64>;

/// Smoothed idf (`ln((1 + n) / (1 + df)) + 1`), raw term counts, L2 normalisation.
fn tfidf_matrix(docs: &[Vec<String>]) -> Vec<TermVector> {
    let n = docs.len() as f64;
    let mut df: HashMap<&str, f64> = HashMap::new();
    for doc in docs {
        let mut terms: Vec<&str> = doc.iter().map(String::as_str).collect();
        terms.sort_unstable();
        terms.dedup();
        for t in terms {
            *df.entry(t).or_insert(0.0) += 1.0;
        }
    }

    docs.iter()
        .map(|doc| {
            let mut v: TermVector = HashMap::new();
            for t in doc {
                *v.entry(t.clone()).or_insert(0.0) += 1.0;
            }
            for (t, w) in v.iter_mut() {
                *w *= ((1.0 + n) / (1.0 + df[t.as_str()])).ln() + 1.0;
            }
            let norm = v.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                v.values_mut().for_each(|w| *w /= norm);
            }
            v
        })
        .collect()
}

fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter_map(|(t, w)| large.get(t).map(|x| w * x)).sum()
}

/// First index of the maximum score, or `NONE` for an empty slice.
pub fn best_of(scores: &[f64]) -> SimilarityResult {
    scores
        .iter()
        .enumerate()
        .fold(SimilarityResult::NONE, |best, (i, &s)| {
            if best.best_index < 0 || s > best.score {
                SimilarityResult { score: s, best_index: i as i64 }
            } else {
                best
            }
        })
}

/// TF-IDF fitted jointly over the text and all candidates, cosine against each candidate.
pub fn tfidf_similarity(text: &str, candidates: &[String]) -> SimilarityResult {
    if text.trim().is_empty() || candidates.is_empty() {
        return SimilarityResult::NONE;
    }
    let docs: Vec<Vec<String>> = std::iter::once(text)
        .chain(candidates.iter().map(String::as_str))
        .map(analyze)
        .collect();
    if docs.iter().all(Vec::is_empty) {
        return SimilarityResult::NONE;
    }
    let matrix = tfidf_matrix(&docs);
    let Some((query, rest)) = matrix.split_first() else {
        return SimilarityResult::NONE;
    };
    let scores: Vec<f64> = rest.iter().map(|c| cosine(query, c)).collect();
    best_of(&scores)
}

/// Overall portal score: the higher of the two methods. An exact tie keeps the lexical index.
// Tie-break follows evaluation order only.
pub fn combine(lexical: SimilarityResult, embedding: SimilarityResult) -> SimilarityResult {
    if lexical.score >= embedding.score {
        lexical
    } else {
        embedding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cands(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_candidates_or_text_give_none() {
        assert_eq!(tfidf_similarity("some text", &[]), SimilarityResult::NONE);
        assert_eq!(tfidf_similarity("   ", &cands(&["a b c"])), SimilarityResult::NONE);
        assert_eq!(tfidf_similarity("the of and", &cands(&["it is"])), SimilarityResult::NONE);
    }

    #[test]
    fn identical_candidate_scores_one() {
        let c = cands(&["Stock markets fell sharply", "Election results confirmed by officials"]);
        let r = tfidf_similarity("Election results confirmed by officials", &c);
        assert_eq!(r.best_index, 1);
        assert!((r.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn unrelated_candidates_score_zero_at_first_index() {
        let r = tfidf_similarity("cricket match", &cands(&["monsoon rainfall", "budget deficit"]));
        assert_eq!(r, SimilarityResult { score: 0.0, best_index: 0 });
    }

    #[test]
    fn partial_overlap_is_between_zero_and_one() {
        let r = tfidf_similarity(
            "Heavy rain floods Mumbai streets",
            &cands(&["Mumbai floods after heavy rain", "Parliament passes new bill"]),
        );
        assert_eq!(r.best_index, 0);
        assert!(r.score > 0.3 && r.score < 1.0);
    }

    #[test]
    fn filler_words_do_not_drive_the_match() {
        let r = tfidf_similarity("also however would many rain", &cands(&["also however would many", "rain"]));
        assert_eq!(r.best_index, 1);
        assert!((r.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn combine_takes_max_and_prefers_lexical_on_tie() {
        let lex = SimilarityResult { score: 0.4, best_index: 2 };
        let emb = SimilarityResult { score: 0.7, best_index: 5 };
        assert_eq!(combine(lex, emb), emb);
        assert_eq!(combine(emb, lex), emb);
        let tie = SimilarityResult { score: 0.4, best_index: 1 };
        assert_eq!(combine(lex, tie).best_index, 2);
        assert_eq!(combine(SimilarityResult::NONE, SimilarityResult::NONE), SimilarityResult::NONE);
    }

    #[test]
    fn best_of_picks_first_maximum() {
        assert_eq!(best_of(&[]), SimilarityResult::NONE);
        assert_eq!(best_of(&[0.2, 0.9, 0.9]).best_index, 1);
    }
}

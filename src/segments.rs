use unicode_segmentation::UnicodeSegmentation;

pub fn segment_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_word(tok: &str) -> bool {
    tok.chars().any(char::is_alphanumeric)
}

fn is_capitalized(tok: &str) -> bool {
    tok.chars().next().is_some_and(char::is_uppercase)
}

/// Runs of capitalised words inside one sentence. Whitespace continues a run, punctuation or a
/// lower-case word ends it. `skip_leading` drops the sentence's first word when it returns true.
pub fn capitalized_runs(sentence: &str, skip_leading: impl Fn(&str) -> bool) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut first_word = true;

    for tok in sentence.split_word_bounds() {
        if tok.trim().is_empty() {
            continue;
        }
        let word = is_word(tok);
        let keep = word && is_capitalized(tok) && !(first_word && skip_leading(tok));
        if keep {
            current.push(tok);
        } else if !current.is_empty() {
            runs.push(current.join(" "));
            current.clear();
        }
        if word {
            first_word = false;
        }
    }
    if !current.is_empty() {
        runs.push(current.join(" "));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_basic_unicode() {
        let txt = "Hello world.  Καλημέρα κόσμε!  你好。";
        let s = segment_sentences(txt);
        assert!(s.len() >= 3);
        assert_eq!(s[0], "Hello world.");
    }

    #[test]
    fn runs_split_on_punctuation_and_lowercase() {
        let runs = capitalized_runs("Officials in New Delhi met Joe Biden, Narendra Modi today.", |_| false);
        assert_eq!(runs, vec!["Officials", "New Delhi", "Joe Biden", "Narendra Modi"]);
    }

    #[test]
    fn leading_word_can_be_skipped() {
        let runs = capitalized_runs("The United Nations said so.", |w| w == "The");
        assert_eq!(runs, vec!["United Nations"]);
    }
}

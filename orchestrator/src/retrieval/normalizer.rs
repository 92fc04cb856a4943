// Text Normalizer: tokenizes a query and drops stop words before lexical search

use std::collections::HashSet;
use std::path::Path;

use unicode_segmentation::UnicodeSegmentation;

/// English stop words as shipped with the common NLP toolkits.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Immutable set of lowercase stop words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn english() -> Self {
        ENGLISH_STOPWORDS.iter().copied().collect()
    }

    /// Loads one stop word per line. Blank lines and `#` comments are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    fn parse(contents: &str) -> Self {
        contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for StopWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .collect(),
        }
    }
}

/// Splits `raw_text` on Unicode word boundaries, drops whitespace and stop
/// words, and joins what is left with single spaces.
///
/// Punctuation segments survive as their own tokens.
pub fn normalize(raw_text: &str, stopwords: &StopWords) -> String {
    raw_text
        .split_word_bounds()
        .filter(|token| !token.trim().is_empty())
        .filter(|token| !stopwords.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_stopwords_case_insensitively() {
        let stopwords = StopWords::english();
        assert_eq!(
            normalize("What is the role of p53 in Apoptosis", &stopwords),
            "role p53 Apoptosis"
        );
    }

    #[test]
    fn test_keeps_punctuation_tokens_and_order() {
        let stopwords: StopWords = ["the"].into_iter().collect();
        assert_eq!(
            normalize("BRCA1,  the   tumour suppressor?", &stopwords),
            "BRCA1 , tumour suppressor ?"
        );
    }

    #[test]
    fn test_empty_input_and_empty_set() {
        assert_eq!(normalize("", &StopWords::english()), "");
        assert_eq!(normalize("   ", &StopWords::english()), "");
        assert_eq!(
            normalize("the cat", &StopWords::empty()),
            "the cat"
        );
    }

    #[test]
    fn test_stopword_set_is_lowercased() {
        let stopwords: StopWords = ["The", "OF"].into_iter().collect();
        assert!(stopwords.contains("the"));
        assert!(stopwords.contains("Of"));
        assert_eq!(stopwords.len(), 2);
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let stopwords = StopWords::parse("# clinical filler\npatient\n\n  study  \n");
        assert_eq!(stopwords.len(), 2);
        assert!(stopwords.contains("Study"));
    }
}

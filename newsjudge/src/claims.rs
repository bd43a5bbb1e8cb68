//! Sentence-level claim extraction.
//!
//! This is a heuristic: every sentence long enough is treated as a checkable
//! claim. It does not detect opinions, quotes or compound statements.

/// Sentences with fewer words than this are not worth checking ("more than 5").
pub const DEFAULT_MIN_WORDS: usize = 6;

/// Splits text into normalized, individually checkable claims
#[derive(Debug, Clone, Copy)]
pub struct ClaimExtractor {
    min_words: usize,
}

impl Default for ClaimExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WORDS)
    }
}

impl ClaimExtractor {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }

    /// Extract claims in document order.
    ///
    /// Each claim is trimmed and ends with exactly one period. Total over any
    /// input: text without a qualifying sentence yields an empty list.
    pub fn extract(&self, text: &str) -> Vec<String> {
        split_sentences(text)
            .into_iter()
            .filter_map(|sentence| {
                let body = sentence
                    .trim()
                    .trim_end_matches(['.', '!', '?'])
                    .trim_end();
                if body.split_whitespace().count() >= self.min_words {
                    Some(format!("{}.", body))
                } else {
                    None
                }
            })
            .collect()
    }
}

/// A sentence ends at `.`, `!` or `?` followed by whitespace (or the end of
/// the text), and at every line break. Decimal points like "3.5" do not split.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let end = match c {
            '\n' => Some(i),
            '.' | '!' | '?' => match chars.peek() {
                None => Some(i + c.len_utf8()),
                Some((_, next)) if next.is_whitespace() => Some(i + c.len_utf8()),
                _ => None,
            },
            _ => None,
        };

        if let Some(end) = end {
            sentences.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sentences_are_dropped() {
        let text = "The sky is blue. It rained yesterday in the city of Springfield.";
        let claims = ClaimExtractor::default().extract(text);
        assert_eq!(claims, vec!["It rained yesterday in the city of Springfield."]);
    }

    #[test]
    fn empty_and_whitespace_yield_nothing() {
        let extractor = ClaimExtractor::default();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   \n\n  ").is_empty());
        assert!(extractor.extract("Too short. Also short!").is_empty());
    }

    #[test]
    fn terminal_punctuation_is_normalized() {
        let text = "Did the council approve the new budget on Monday?   \
                    The mayor resigned after six years in office!!  \
                    Unemployment rose to 3.5 percent in the third quarter";
        let claims = ClaimExtractor::default().extract(text);
        assert_eq!(
            claims,
            vec![
                "Did the council approve the new budget on Monday.",
                "The mayor resigned after six years in office.",
                "Unemployment rose to 3.5 percent in the third quarter.",
            ]
        );
    }

    #[test]
    fn line_breaks_end_sentences() {
        let text = "First judge says the bridge opened in 1932\nSecond judge says the bridge opened in the spring";
        let claims = ClaimExtractor::default().extract(text);
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0], "First judge says the bridge opened in 1932.");
    }

    #[test]
    fn threshold_is_configurable() {
        let text = "The sky is blue. Water is wet.";
        assert_eq!(ClaimExtractor::new(3).extract(text), vec!["The sky is blue.", "Water is wet."]);
        assert_eq!(ClaimExtractor::new(4).extract(text), vec!["The sky is blue."]);
    }

    #[test]
    fn extraction_is_idempotent_on_its_output() {
        let text = "Officials said   the dam was repaired in 2019 after the flood. Short one. \
                    Residents were evacuated from three villages near the river!\n\
                    Critics claim the repairs cost twice the original estimate";
        let extractor = ClaimExtractor::default();
        let first = extractor.extract(text);
        let second = extractor.extract(&first.join(" "));
        assert_eq!(first, second);

        let third = extractor.extract(&first.join("\n"));
        assert_eq!(first, third);
    }

    #[test]
    fn multibyte_text_is_split_safely() {
        let text = "Le président a annoncé une réforme très attendue. Ça ira.";
        let claims = ClaimExtractor::default().extract(text);
        assert_eq!(claims, vec!["Le président a annoncé une réforme très attendue."]);
    }
}

//! Featurizers bundled with the binary.

use crate::plugins::{BatchTransform, ElementTransform, Featurizer, PluginRegistry, FEATURIZE_DOMAIN};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub fn register_builtins(registry: &mut PluginRegistry) {
    registry.register(FEATURIZE_DOMAIN, "wordcount", || {
        Featurizer::elementwise("wordcount", WordCount)
    });
    registry.register(FEATURIZE_DOMAIN, "charcount", || {
        Featurizer::elementwise("charcount", CharCount)
    });
    registry.register(FEATURIZE_DOMAIN, "bag_of_words", || {
        Featurizer::batch("bag_of_words", BagOfWords)
    });
}

/// Number of whitespace-separated tokens.
pub struct WordCount;

impl ElementTransform for WordCount {
    fn featurize(&self, text: &str) -> anyhow::Result<String> {
        Ok(text.split_whitespace().count().to_string())
    }
}

/// Number of characters (not bytes).
pub struct CharCount;

impl ElementTransform for CharCount {
    fn featurize(&self, text: &str) -> anyhow::Result<String> {
        Ok(text.chars().count().to_string())
    }
}

/// Term counts over a vocabulary built from the whole column.
///
/// Each row becomes a JSON array aligned with the sorted vocabulary, so
/// every row of one dataset has the same width.
pub struct BagOfWords;

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"[\p{L}\p{N}']+").expect("valid word regex"))
}

fn tokenize(text: &str) -> Vec<String> {
    word_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

impl BatchTransform for BagOfWords {
    fn featurize_list(&self, texts: &[String]) -> anyhow::Result<Vec<String>> {
        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();

        let mut vocab: BTreeMap<&str, usize> = BTreeMap::new();
        for token in tokenized.iter().flatten() {
            vocab.entry(token.as_str()).or_insert(0);
        }
        for (i, slot) in vocab.values_mut().enumerate() {
            *slot = i;
        }

        tokenized
            .iter()
            .map(|tokens| -> anyhow::Result<String> {
                let mut counts = vec![0u32; vocab.len()];
                for token in tokens {
                    counts[vocab[token.as_str()]] += 1;
                }
                Ok(serde_json::to_string(&counts)?)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wordcount_counts_tokens() {
        assert_eq!(WordCount.featurize("great product").unwrap(), "2");
        assert_eq!(WordCount.featurize("bad").unwrap(), "1");
        assert_eq!(WordCount.featurize("   ").unwrap(), "0");
    }

    #[test]
    fn charcount_counts_chars() {
        assert_eq!(CharCount.featurize("héllo").unwrap(), "5");
    }

    #[test]
    fn bag_of_words_aligns_to_sorted_vocab() {
        // vocab: bad, great, product
        let out = BagOfWords
            .featurize_list(&texts(&["Great product, great!", "bad"]))
            .unwrap();
        assert_eq!(out, vec!["[0,2,1]", "[1,0,0]"]);
    }

    #[test]
    fn bag_of_words_empty_column() {
        assert!(BagOfWords.featurize_list(&[]).unwrap().is_empty());
    }

    #[test]
    fn builtins_are_registered() {
        let registry = PluginRegistry::with_builtins();
        assert_eq!(
            registry.names(FEATURIZE_DOMAIN),
            vec!["bag_of_words", "charcount", "wordcount"]
        );
    }
}

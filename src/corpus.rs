//! Reference corpus: the raw word sequence that feeds the frequency table
//! and the verbatim vocabulary of the sentence harness.

use fxhash::FxHashSet;
use log::info;
use std::fs;
use std::path::Path;

use crate::algorithms::frequency::FrequencyTable;
use crate::error::Result;
use crate::sentence::isolate_punctuation;

const DEFAULT_CHUNK_SIZE: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusConfig {
    /// Only the first `max_words` words are kept, when set.
    pub max_words: Option<usize>,
    /// Words per parallel counting task.
    pub chunk_size: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            max_words: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl CorpusConfig {
    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = Some(max_words);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Corpus {
    words: Vec<String>,
    known: FxHashSet<String>,
    config: CorpusConfig,
}

impl Corpus {
    pub fn from_words<I, S>(words: I, config: CorpusConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let limit = config.max_words.unwrap_or(usize::MAX);
        let words: Vec<String> = words
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !w.is_empty())
            .take(limit)
            .collect();
        let known = words.iter().cloned().collect();
        Self {
            words,
            known,
            config,
        }
    }

    /// Split raw text into words, isolating `. , ! ? ( )` as their own words.
    pub fn from_text(text: &str, config: CorpusConfig) -> Self {
        let spaced = isolate_punctuation(text);
        Self::from_words(spaced.split_whitespace(), config)
    }

    pub fn load<P: AsRef<Path>>(path: P, config: CorpusConfig) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let corpus = Self::from_text(&text, config);
        info!(
            "Loaded {} words ({} distinct) from {}",
            corpus.len(),
            corpus.known.len(),
            path.as_ref().display()
        );
        Ok(corpus)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Case-sensitive membership in the raw word sequence.
    pub fn contains_word(&self, word: &str) -> bool {
        self.known.contains(word)
    }

    /// Lowercased word counts, tallied in parallel.
    pub fn frequency_table(&self) -> FrequencyTable {
        FrequencyTable::from_words_par(&self.words, self.config.chunk_size)
    }
}

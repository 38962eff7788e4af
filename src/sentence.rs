//! Sentence-level harness around the segmenter.
//!
//! Text is split into whitespace-delimited chunks after isolating
//! punctuation. Chunks found verbatim in the reference vocabulary are kept;
//! the rest are segmented. The result is the flattened token sequence in
//! input order.

use rayon::prelude::*;
use regex::Regex;
use std::sync::LazyLock;

use crate::algorithms::segmenter::Segmenter;
use crate::corpus::Corpus;
use crate::error::Result;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.,!?()])").expect("valid punctuation pattern"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace pattern"));

/// Surround `. , ! ? ( )` with spaces and collapse whitespace runs.
pub fn isolate_punctuation(text: &str) -> String {
    let spaced = PUNCTUATION.replace_all(text, " $1 ");
    WHITESPACE_RUN.replace_all(&spaced, " ").into_owned()
}

/// Join tokens with single spaces for display.
pub fn join<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ")
}

pub struct SentenceSegmenter<'a> {
    segmenter: Segmenter<'a>,
    // Verbatim vocabulary. Without a corpus, the table's keys are used.
    corpus: Option<&'a Corpus>,
}

impl<'a> SentenceSegmenter<'a> {
    pub fn new(segmenter: Segmenter<'a>) -> Self {
        Self {
            segmenter,
            corpus: None,
        }
    }

    pub fn with_corpus(segmenter: Segmenter<'a>, corpus: &'a Corpus) -> Self {
        Self {
            segmenter,
            corpus: Some(corpus),
        }
    }

    fn is_known(&self, chunk: &str) -> bool {
        match self.corpus {
            Some(corpus) => corpus.contains_word(chunk),
            None => self.segmenter.table().contains(chunk),
        }
    }

    pub fn segment_text(&self, text: &str) -> Result<Vec<String>> {
        let spaced = isolate_punctuation(text);
        let mut out = Vec::new();

        for chunk in spaced.split_whitespace() {
            if self.is_known(chunk) {
                out.push(chunk.to_string());
            } else {
                let tokens = self.segmenter.segment(chunk)?;
                out.extend(tokens.into_iter().map(String::from));
            }
        }
        Ok(out)
    }

    /// Segment independent lines in parallel; output order follows input.
    pub fn segment_lines<S>(&self, lines: &[S]) -> Result<Vec<Vec<String>>>
    where
        S: AsRef<str> + Sync,
    {
        lines
            .par_iter()
            .map(|line| self.segment_text(line.as_ref()))
            .collect()
    }
}

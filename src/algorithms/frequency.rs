use dashmap::DashMap;
use fxhash::FxHashMap;
use log::info;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use crate::error::{Result, SegmentError};

const HEADER: &str = "Token\tCount";

// Backslash must be escaped before the control characters.
fn escape(token: &str) -> String {
    token
        .replace('\\', "\\\\")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Immutable token -> occurrence count mapping.
///
/// Every key is non-empty and every stored count is at least 1; lookups of
/// absent tokens report 0. Built once, then shared by reference with every
/// segmentation call.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: FxHashMap<String, u64>,
    // Longest key in chars. No prefix longer than this can match.
    max_token_chars: usize,
}

impl FrequencyTable {
    /// Build from explicit (token, count) pairs. Repeated tokens accumulate.
    pub fn from_counts<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut counts = FxHashMap::default();
        for (token, count) in entries {
            let token = token.into();
            if token.is_empty() {
                return Err(SegmentError::InvalidInput("empty token in frequency table".into()));
            }
            if count == 0 {
                return Err(SegmentError::InvalidInput(format!(
                    "token '{}' has a zero count",
                    token
                )));
            }
            *counts.entry(token).or_insert(0) += count;
        }
        Ok(Self::from_map(counts))
    }

    /// Count a word sequence, lowercasing each word. Empty words are skipped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: FxHashMap<String, u64> = FxHashMap::default();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            *counts.entry(word.to_lowercase()).or_insert(0) += 1;
        }
        Self::from_map(counts)
    }

    /// Same result as [`from_words`](Self::from_words), counted in parallel
    /// over chunks of `chunk_size` words.
    pub fn from_words_par<S>(words: &[S], chunk_size: usize) -> Self
    where
        S: AsRef<str> + Sync,
    {
        let shared: DashMap<String, u64> = DashMap::new();

        words.par_chunks(chunk_size.max(1)).for_each(|chunk| {
            for word in chunk {
                let word = word.as_ref();
                if word.is_empty() {
                    continue;
                }
                // entry() holds the shard lock for the increment
                *shared.entry(word.to_lowercase()).or_insert(0) += 1;
            }
        });

        let counts: FxHashMap<String, u64> = shared.into_iter().collect();
        info!(
            "Counted {} words into {} distinct tokens",
            words.len(),
            counts.len()
        );
        Self::from_map(counts)
    }

    fn from_map(counts: FxHashMap<String, u64>) -> Self {
        let max_token_chars = counts.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        Self {
            counts,
            max_token_chars,
        }
    }

    /// Occurrence count of `token`, 0 when absent.
    pub fn count(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.counts.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn max_token_chars(&self) -> usize {
        self.max_token_chars
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The `n` most frequent tokens, by descending count then token.
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut all: Vec<(&str, u64)> = self.iter().collect();
        all.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        all.truncate(n);
        all
    }

    /// Load a table written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_from(io::BufReader::new(file))
    }

    pub fn read_from<R: BufRead>(reader: R) -> Result<Self> {
        let mut counts = FxHashMap::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            if line.is_empty() || (idx == 0 && line.starts_with("Token\t")) {
                continue;
            }

            let (token, count) = line
                .rsplit_once('\t')
                .ok_or_else(|| SegmentError::MalformedEntry {
                    line: line_no,
                    reason: "missing tab separator".into(),
                })?;

            let count: u64 = count.trim().parse().map_err(|_| SegmentError::MalformedEntry {
                line: line_no,
                reason: format!("count '{}' is not a non-negative integer", count),
            })?;
            if count == 0 || token.is_empty() {
                return Err(SegmentError::MalformedEntry {
                    line: line_no,
                    reason: "empty token or zero count".into(),
                });
            }

            let token = unescape(token);
            *counts.entry(token).or_insert(0) += count;
        }

        Ok(Self::from_map(counts))
    }

    /// Write the table as `Token\tCount` TSV, most frequent first.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "{}", HEADER)?;
        for (token, count) in self.top(self.len()) {
            // Escaped so the file remains line-based
            writeln!(writer, "{}\t{}", escape(token), count)?;
        }
        Ok(())
    }
}

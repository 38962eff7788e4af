//! Maximum-score word segmentation.
//!
//! A run with no word boundaries is decomposed into vocabulary entries by an
//! exhaustive breadth-first search: states are expanded first-in-first-out,
//! and from each state every matching prefix is tried shortest first. Each
//! completed decomposition is scored by [`score`] and the best one wins;
//! ties go to the decomposition that completed first.

use log::{debug, warn};
use std::collections::VecDeque;
use std::rc::Rc;

use super::frequency::FrequencyTable;
use crate::error::{Result, SegmentError};

const DEFAULT_MAX_STEPS: usize = 1_000_000;
const DEFAULT_MAX_FRONTIER: usize = 1_000_000;

pub const MAX_STEPS_ENV: &str = "FREQSEG_MAX_STEPS";
pub const MAX_FRONTIER_ENV: &str = "FREQSEG_MAX_FRONTIER";

/// Search ceilings. Runs that exceed either one are passed through verbatim
/// by [`Segmenter::segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Maximum number of states taken off the frontier.
    pub max_steps: usize,
    /// Maximum number of states waiting on the frontier.
    pub max_frontier: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_frontier: DEFAULT_MAX_FRONTIER,
        }
    }
}

impl SegmenterConfig {
    /// No ceilings at all: every decomposition is enumerated.
    pub fn unbounded() -> Self {
        Self {
            max_steps: usize::MAX,
            max_frontier: usize::MAX,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_frontier(mut self, max_frontier: usize) -> Self {
        self.max_frontier = max_frontier;
        self
    }

    /// Defaults, overridden by `FREQSEG_MAX_STEPS` / `FREQSEG_MAX_FRONTIER`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_steps: parse_limit(
                MAX_STEPS_ENV,
                std::env::var(MAX_STEPS_ENV).ok(),
                defaults.max_steps,
            ),
            max_frontier: parse_limit(
                MAX_FRONTIER_ENV,
                std::env::var(MAX_FRONTIER_ENV).ok(),
                defaults.max_frontier,
            ),
        }
    }
}

fn parse_limit(name: &str, raw: Option<String>, default: usize) -> usize {
    match raw {
        None => default,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!("Ignoring {}={:?}, using {}", name, raw, default);
                default
            }
        },
    }
}

/// Contribution of one token: `count ^ chars`.
fn token_weight(count: u64, chars: usize) -> f64 {
    (count as f64).powi(i32::try_from(chars).unwrap_or(i32::MAX))
}

/// Sum of token weights. Kept exact in `u128` until it overflows, so that
/// rounding happens once, at the final division.
#[derive(Debug, Clone, Copy)]
struct WeightSum {
    exact: Option<u128>,
    approx: f64,
}

impl WeightSum {
    const ZERO: Self = Self {
        exact: Some(0),
        approx: 0.0,
    };

    fn add(self, count: u64, chars: usize) -> Self {
        let exact = u32::try_from(chars)
            .ok()
            .and_then(|c| u128::from(count).checked_pow(c))
            .and_then(|w| self.exact?.checked_add(w));
        Self {
            exact,
            approx: self.approx + token_weight(count, chars),
        }
    }

    fn mean(&self, tokens: usize) -> f64 {
        let total = match self.exact {
            Some(sum) => sum as f64,
            None => self.approx,
        };
        total / tokens as f64
    }
}

/// Mean of `count(t) ^ len(t)` over the tokens of a candidate, with `len`
/// measured in chars and absent tokens counting 0.
///
/// Long, well-attested tokens dominate: with `{"a":10, "ab":10, "b":10}`,
/// `["ab"]` scores 100 while `["a", "b"]` scores 10. An empty candidate
/// scores 0.0.
pub fn score(candidate: &[&str], table: &FrequencyTable) -> f64 {
    if candidate.is_empty() {
        return 0.0;
    }
    candidate
        .iter()
        .fold(WeightSum::ZERO, |sum, token| {
            sum.add(table.count(token), token.chars().count())
        })
        .mean(candidate.len())
}

/// Order candidates best first. The sort is stable, so equal scores keep
/// their enumeration order.
pub fn rank<'r>(
    candidates: Vec<Vec<&'r str>>,
    table: &FrequencyTable,
) -> Vec<(Vec<&'r str>, f64)> {
    let mut scored: Vec<(Vec<&'r str>, f64)> = candidates
        .into_iter()
        .map(|c| {
            let s = score(&c, table);
            (c, s)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Segment `run` against `table` with the default ceilings.
pub fn segment<'r>(run: &'r str, table: &FrequencyTable) -> Result<Vec<&'r str>> {
    Segmenter::new(table).segment(run)
}

// Persistent path: each node is one token, a byte range into the run, and
// shares its prefix with every sibling expanded from the same state.
struct PathNode {
    start: usize,
    end: usize,
    parent: Option<Rc<PathNode>>,
    // Running sum of token weights and token count, so completed paths are
    // scored without re-walking them.
    weight: WeightSum,
    tokens: usize,
}

impl PathNode {
    fn extend(
        parent: &Option<Rc<PathNode>>,
        start: usize,
        end: usize,
        count: u64,
        chars: usize,
    ) -> Self {
        let (prev_weight, prev_tokens) = parent
            .as_ref()
            .map_or((WeightSum::ZERO, 0), |p| (p.weight, p.tokens));
        Self {
            start,
            end,
            parent: parent.clone(),
            weight: prev_weight.add(count, chars),
            tokens: prev_tokens + 1,
        }
    }

    fn score(&self) -> f64 {
        self.weight.mean(self.tokens)
    }

    fn tokens<'r>(&self, run: &'r str) -> Vec<&'r str> {
        let mut out = Vec::with_capacity(self.tokens);
        let mut node = Some(self);
        while let Some(n) = node {
            out.push(&run[n.start..n.end]);
            node = n.parent.as_deref();
        }
        out.reverse();
        out
    }
}

struct SearchState {
    path: Option<Rc<PathNode>>,
    offset: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct SearchStats {
    steps: usize,
    peak_frontier: usize,
    completed: usize,
}

/// Segments runs against a shared, read-only [`FrequencyTable`].
#[derive(Debug, Clone, Copy)]
pub struct Segmenter<'t> {
    table: &'t FrequencyTable,
    config: SegmenterConfig,
}

impl<'t> Segmenter<'t> {
    pub fn new(table: &'t FrequencyTable) -> Self {
        Self::with_config(table, SegmenterConfig::default())
    }

    pub fn with_config(table: &'t FrequencyTable, config: SegmenterConfig) -> Self {
        Self { table, config }
    }

    pub fn table(&self) -> &'t FrequencyTable {
        self.table
    }

    /// Best decomposition of `run`, or `[run]` when there is none or the
    /// search budget runs out. Fails only on an empty run.
    pub fn segment<'r>(&self, run: &'r str) -> Result<Vec<&'r str>> {
        match self.try_segment(run) {
            Ok(Some(tokens)) => Ok(tokens),
            Ok(None) => Ok(vec![run]),
            Err(e) if e.is_recoverable() => {
                warn!("Passing '{}' through verbatim: {}", run, e);
                Ok(vec![run])
            }
            Err(e) => Err(e),
        }
    }

    /// Best decomposition of `run`; `Ok(None)` when no decomposition into
    /// table entries exists. Budget exhaustion is reported, not absorbed.
    pub fn try_segment<'r>(&self, run: &'r str) -> Result<Option<Vec<&'r str>>> {
        let mut best: Option<(Rc<PathNode>, f64)> = None;

        self.search(run, |node| {
            let s = node.score();
            // Strict comparison: the earliest of equal scores stays.
            if best.as_ref().map_or(true, |(_, b)| s > *b) {
                best = Some((Rc::clone(node), s));
            }
        })?;

        Ok(best.map(|(node, _)| node.tokens(run)))
    }

    /// Every complete decomposition of `run`, in enumeration order.
    pub fn candidates<'r>(&self, run: &'r str) -> Result<Vec<Vec<&'r str>>> {
        let mut found = Vec::new();
        self.search(run, |node| found.push(node.tokens(run)))?;
        Ok(found)
    }

    fn search<F>(&self, run: &str, mut on_complete: F) -> Result<SearchStats>
    where
        F: FnMut(&Rc<PathNode>),
    {
        if run.is_empty() {
            return Err(SegmentError::InvalidInput("cannot segment an empty run".into()));
        }

        let max_chars = self.table.max_token_chars();
        let mut stats = SearchStats::default();
        let mut frontier = VecDeque::new();
        frontier.push_back(SearchState {
            path: None,
            offset: 0,
        });

        while let Some(state) = frontier.pop_front() {
            if stats.steps >= self.config.max_steps {
                return Err(SegmentError::SearchBudgetExceeded {
                    steps: stats.steps,
                    frontier: frontier.len() + 1,
                });
            }
            stats.steps += 1;

            let remaining = &run[state.offset..];
            if remaining.is_empty() {
                if let Some(node) = &state.path {
                    stats.completed += 1;
                    on_complete(node);
                }
                continue;
            }

            // Prefixes are cut on char boundaries, shortest first.
            for (n, (byte_offset, ch)) in remaining.char_indices().enumerate().take(max_chars) {
                let end = byte_offset + ch.len_utf8();
                let count = self.table.count(&remaining[..end]);
                if count == 0 {
                    continue;
                }
                let node = PathNode::extend(
                    &state.path,
                    state.offset,
                    state.offset + end,
                    count,
                    n + 1,
                );
                frontier.push_back(SearchState {
                    path: Some(Rc::new(node)),
                    offset: state.offset + end,
                });
            }

            if frontier.len() > self.config.max_frontier {
                return Err(SegmentError::SearchBudgetExceeded {
                    steps: stats.steps,
                    frontier: frontier.len(),
                });
            }
            stats.peak_frontier = stats.peak_frontier.max(frontier.len());
        }

        debug!(
            "Segmented {:?}: {} steps, peak frontier {}, {} candidates",
            run, stats.steps, stats.peak_frontier, stats.completed
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, u64)]) -> FrequencyTable {
        FrequencyTable::from_counts(entries.iter().copied()).unwrap()
    }

    #[test]
    fn longer_token_beats_fragments() {
        let t = table(&[("a", 10), ("ab", 10), ("b", 10)]);
        assert_eq!(score(&["ab"], &t), 100.0);
        assert_eq!(score(&["a", "b"], &t), 10.0);
        assert_eq!(segment("ab", &t).unwrap(), vec!["ab"]);
    }

    #[test]
    fn splits_joined_words() {
        let t = table(&[("wisdom", 50), ("of", 200), ("life", 300)]);
        assert_eq!(segment("wisdomoflife", &t).unwrap(), vec!["wisdom", "of", "life"]);
    }

    #[test]
    fn unknown_run_passes_through() {
        let t = table(&[("a", 3)]);
        assert_eq!(segment("xyz", &t).unwrap(), vec!["xyz"]);
        assert_eq!(Segmenter::new(&t).try_segment("xyz").unwrap(), None);
    }

    #[test]
    fn partial_cover_passes_through() {
        // "ab" matches but the trailing "x" never does
        let t = table(&[("a", 3), ("b", 3), ("ab", 3)]);
        assert_eq!(segment("abx", &t).unwrap(), vec!["abx"]);
    }

    #[test]
    fn empty_run_is_rejected() {
        let t = table(&[("a", 1)]);
        assert!(matches!(segment("", &t), Err(SegmentError::InvalidInput(_))));
        assert!(matches!(
            Segmenter::new(&t).candidates(""),
            Err(SegmentError::InvalidInput(_))
        ));
    }

    #[test]
    fn enumeration_is_breadth_first_shortest_prefix_first() {
        let t = table(&[("a", 1), ("aa", 1)]);
        let found = Segmenter::new(&t).candidates("aaa").unwrap();
        assert_eq!(
            found,
            vec![vec!["a", "aa"], vec!["aa", "a"], vec!["a", "a", "a"]]
        );
    }

    #[test]
    fn equal_scores_keep_first_enumerated() {
        // ["a","bc"] and ["ab","c"] both score (4 + 4) / 2
        let t = table(&[("a", 4), ("bc", 2), ("ab", 2), ("c", 4)]);
        let seg = Segmenter::new(&t);
        let found = seg.candidates("abc").unwrap();
        assert_eq!(found, vec![vec!["a", "bc"], vec!["ab", "c"]]);
        assert_eq!(score(&found[0], &t), score(&found[1], &t));
        assert_eq!(seg.segment("abc").unwrap(), vec!["a", "bc"]);

        let ranked = rank(found, &t);
        assert_eq!(ranked[0].0, vec!["a", "bc"]);
    }

    #[test]
    fn fewer_tokens_complete_first_on_ties() {
        // ["ab"] scores 2^2 = 4, ["a","b"] scores (4 + 4) / 2 = 4
        let t = table(&[("a", 4), ("b", 4), ("ab", 2)]);
        assert_eq!(segment("ab", &t).unwrap(), vec!["ab"]);
    }

    #[test]
    fn whole_run_wins_when_it_scores_highest() {
        // 10^9 against (40^3 + 30^6) / 2
        let t = table(&[("sun", 40), ("flower", 30), ("sunflower", 10), ("s", 2)]);
        assert_eq!(segment("sunflower", &t).unwrap(), vec!["sunflower"]);
    }

    #[test]
    fn step_budget_is_reported_and_absorbed() {
        let t = table(&[("a", 1), ("aa", 1)]);
        let config = SegmenterConfig::default().with_max_steps(3);
        let seg = Segmenter::with_config(&t, config);

        match seg.try_segment("aaaaaa") {
            Err(SegmentError::SearchBudgetExceeded { steps, .. }) => assert_eq!(steps, 3),
            other => panic!("expected budget error, got {:?}", other),
        }
        assert_eq!(seg.segment("aaaaaa").unwrap(), vec!["aaaaaa"]);
    }

    #[test]
    fn frontier_budget_is_reported() {
        let t = table(&[("a", 1), ("aa", 1), ("aaa", 1)]);
        let config = SegmenterConfig::unbounded().with_max_frontier(2);
        let seg = Segmenter::with_config(&t, config);
        assert!(matches!(
            seg.try_segment("aaaa"),
            Err(SegmentError::SearchBudgetExceeded { frontier: 3, .. })
        ));
    }

    #[test]
    fn multibyte_runs_split_on_char_boundaries() {
        let t = table(&[("naïve", 3), ("té", 2), ("é", 9)]);
        let tokens = segment("naïveté", &t).unwrap();
        assert_eq!(tokens.concat(), "naïveté");
        assert_eq!(tokens, vec!["naïve", "té"]);
    }

    #[test]
    fn score_treats_absent_tokens_as_zero() {
        let t = table(&[("of", 3)]);
        assert_eq!(score(&["of", "zz"], &t), 4.5);
        assert_eq!(score(&[], &t), 0.0);
    }

    #[test]
    fn weights_are_summed_exactly_before_dividing() {
        // 2^53 + 1 + 1 is not reachable by adding in f64 one token at a time
        let long = "x".repeat(53);
        let t = table(&[(long.as_str(), 2), ("b", 1), ("c", 1)]);
        let expected = ((1u128 << 53) + 2) as f64 / 3.0;
        assert_eq!(score(&[long.as_str(), "b", "c"], &t), expected);

        let run = format!("{}bc", long);
        let found = Segmenter::new(&t).try_segment(&run).unwrap().unwrap();
        assert_eq!(score(&found, &t), expected);
    }

    #[test]
    fn overflowing_weights_fall_back_to_floating_point() {
        let t = table(&[("abc", u64::MAX), ("d", 3)]);
        let s = score(&["abc", "d"], &t);
        assert!(s.is_finite());
        assert!(s > (u64::MAX as f64).powi(3) / 2.0 * 0.99);
    }

    #[test]
    fn limits_fall_back_on_bad_values() {
        assert_eq!(parse_limit("X", None, 7), 7);
        assert_eq!(parse_limit("X", Some("12".into()), 7), 12);
        assert_eq!(parse_limit("X", Some("zero".into()), 7), 7);
        assert_eq!(parse_limit("X", Some("0".into()), 7), 7);
    }
}

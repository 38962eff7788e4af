//! Frequency-weighted word segmentation.
//!
//! Splits runs of text with missing or corrupted word boundaries into the
//! most probable sequence of known words, scored against a reference
//! [`FrequencyTable`].
//!
//! ```
//! use freqseg::{segment, FrequencyTable};
//!
//! let table = FrequencyTable::from_counts([("wisdom", 50), ("of", 200), ("life", 300)])?;
//! assert_eq!(segment("wisdomoflife", &table)?, vec!["wisdom", "of", "life"]);
//! # Ok::<(), freqseg::SegmentError>(())
//! ```

pub mod algorithms;
pub mod corpus;
pub mod error;
pub mod sentence;

pub use algorithms::frequency::FrequencyTable;
pub use algorithms::segmenter::{rank, score, segment, Segmenter, SegmenterConfig};
pub use corpus::{Corpus, CorpusConfig};
pub use error::{Result, SegmentError};
pub use sentence::SentenceSegmenter;

pub mod frequency;
pub mod segmenter;

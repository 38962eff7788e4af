use std::env;
use std::time::Instant;

use freqseg::sentence::join;
use freqseg::{FrequencyTable, Segmenter, SegmenterConfig, SentenceSegmenter};

fn main() {
    env_logger::init();

    // Usage: tokenize [text] [counts.tsv]
    let args: Vec<String> = env::args().collect();
    let default_text = "the quick brownfox jumps overthe lazy dog";
    let input_text = args.get(1).map(String::as_str).unwrap_or(default_text);
    let table_path = args.get(2).map(String::as_str).unwrap_or("counts.tsv");

    let table = match FrequencyTable::load(table_path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!(
                "Failed to load '{}'. Make sure you ran freqseg first.\nError: {}",
                table_path, e
            );
            return;
        }
    };

    println!("Loaded table: {} tokens", table.len());
    println!("Max token length in table: {} chars", table.max_token_chars());
    println!("\nInput Text:\n'{}'", input_text);

    let segmenter = Segmenter::with_config(&table, SegmenterConfig::from_env());
    let harness = SentenceSegmenter::new(segmenter);

    let start = Instant::now();
    match harness.segment_text(input_text) {
        Ok(result) => {
            println!(
                "\nSegmented Output ({} tokens in {:.2?}):",
                result.len(),
                start.elapsed()
            );
            println!("{:?}", result);
            println!("\nJoined: '{}'", join(&result));
        }
        Err(e) => eprintln!("Segmentation failed: {}", e),
    }
}

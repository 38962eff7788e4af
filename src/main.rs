use std::env;
use std::time::Instant;

use freqseg::sentence::join;
use freqseg::{Corpus, CorpusConfig, Segmenter, SegmenterConfig, SentenceSegmenter};

const DEFAULT_MAX_WORDS: usize = 100_000;
const TABLE_PATH: &str = "counts.tsv";

const SAMPLE: &str = "A woman walks by the bench I'm sitting onwith her dog that looks part Lab, \
                      part Buick,stops and asks if I would like to dance.I smile, tell her of \
                      course I do. We decideon a waltz that she begins to hum";

fn main() {
    env_logger::init();

    // Usage: freqseg [corpus.txt] [max_words]
    let args: Vec<String> = env::args().collect();
    let file_path = args.get(1).map(String::as_str).unwrap_or("corpus.txt");
    let max_words = args
        .get(2)
        .and_then(|n| n.parse().ok())
        .unwrap_or(DEFAULT_MAX_WORDS);

    // 1. Load corpus
    println!("Loading {}...", file_path);
    let config = CorpusConfig::default().with_max_words(max_words);
    let corpus = match Corpus::load(file_path, config) {
        Ok(corpus) => corpus,
        Err(e) => {
            println!("Could not read '{}' ({}), falling back to the sample sentence", file_path, e);
            Corpus::from_text(SAMPLE, config)
        }
    };
    println!("Loaded {} words. Counting...", corpus.len());

    // 2. Count in parallel, then freeze
    let start_time = Instant::now();
    let table = corpus.frequency_table();
    println!(
        "Counted {} distinct tokens in {:.2?}.",
        table.len(),
        start_time.elapsed()
    );

    println!("\nTop 10 tokens:");
    for (t, c) in table.top(10) {
        println!("'{}': {}", t, c);
    }

    // 3. Demo
    println!("\n--- Segmentation Demo ---");
    let segmenter = Segmenter::with_config(&table, SegmenterConfig::from_env());
    let harness = SentenceSegmenter::with_corpus(segmenter, &corpus);
    let start = Instant::now();
    match harness.segment_text(SAMPLE) {
        Ok(tokens) => {
            println!("Segmented in {:.2?}.", start.elapsed());
            println!("{}", SAMPLE);
            println!("{}", join(&tokens));
        }
        Err(e) => eprintln!("Segmentation failed: {}", e),
    }

    // 4. Save table
    println!("\nSaving {} tokens to '{}'...", table.len(), TABLE_PATH);
    if let Err(e) = table.save(TABLE_PATH) {
        eprintln!("Failed to write '{}': {}", TABLE_PATH, e);
        return;
    }
    println!("Done.");
}

use nested_ner_eval::{evaluate, DepthMatching, NestedEvalConfigBuilder, SentenceRecord};
use serde_jsonlines::json_lines;
use std::ops::Range;
use std::path::Path;
use std::time::{Duration, Instant};

use clap::Parser;

fn read_sentences<P: AsRef<Path>>(path: P) -> Vec<SentenceRecord<'static>> {
    json_lines::<SentenceRecord<'static>, P>(path)
        .unwrap()
        .map(|r| r.unwrap())
        .collect::<Vec<_>>()
}

#[derive(Debug, Parser)]
struct Args {
    #[arg(short, long, default_value_t = 1)]
    n_samples: u32,
    #[arg(short, long, default_value_t=String::from("big"))]
    dataset: String,
    /// Depth matching, either `relaxed` or `strict`
    #[arg(short, long, default_value_t = DepthMatching::Relaxed)]
    matching: DepthMatching,
    /// Print the last report
    #[arg(short, long)]
    print: bool,
}

fn main() {
    let args = Args::parse();
    let n_samples = args.n_samples;
    let iter = Range {
        start: 0,
        end: n_samples,
    };
    let config = NestedEvalConfigBuilder::default()
        .depth_matching(args.matching)
        .build();
    let mut total_duration = Duration::ZERO;
    let path = format!("./data/datasets/{}_nested_dataset.jsonl", args.dataset);
    let mut last_report = None;
    for _ in iter {
        let sentences = read_sentences(&path);
        let now = Instant::now();
        let report = evaluate(&sentences, &config).unwrap();
        let elapsed = now.elapsed();
        total_duration += elapsed;
        last_report = Some(report);
    }
    if let (true, Some(report)) = (args.print, last_report) {
        println!("{}", report);
    }
    println!(
        "Total duration: {} with {n_samples} samples",
        total_duration.as_secs_f64()
    )
}

use occam::analysis::{nearest_neighbor_agreement, rank};
use occam::config::{config_from_args, TrainingConfig};
use occam::data::{self, Sample};
use occam::network::Network;
use occam::tensor::ParameterSet;
use occam::training::{write_history, Pass, Trainer};
use occam::utils::SeededRng;
use occam::Error;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use std::time::Instant;

// Word vectors are drawn around one axis per word class.
const WORD_CLASSES: usize = 3;
const WORDS_PER_CLASS: usize = 4;
const SYMBOL_WIDTH: usize = 8;
const POSITION_WIDTH: usize = 8;
const LENGTH: usize = 64;
const SENTENCES: usize = 32;

// Sentence shapes as sequences of word classes.
const TEMPLATES: [&[usize]; 3] = [&[0, 1, 2, 0, 1], &[0, 1, 2], &[1, 2, 0, 1, 2, 0]];

struct Summary {
    agreement: f64,
    initial_loss: Option<f64>,
    trailing_loss: Option<f64>,
    iterations: usize,
}

/// Random sentences, each a list of indices into `words`.
fn sentences(rng: &mut SeededRng, count: usize) -> Vec<Vec<usize>> {
    (0..count)
        .map(|_| {
            let template = TEMPLATES[rng.gen_usize(TEMPLATES.len())];
            template
                .iter()
                .map(|&class| class * WORDS_PER_CLASS + rng.gen_usize(WORDS_PER_CLASS))
                .collect()
        })
        .collect()
}

fn longest(sentences: &[Vec<usize>]) -> usize {
    sentences.iter().map(Vec::len).max().unwrap_or(0)
}

fn run(config: &TrainingConfig, out_dir: &Path) -> Result<Summary, Box<dyn StdError>> {
    let mut rng = SeededRng::new(config.seed());

    let mut words: Vec<Sample> = data::synthetic_clusters(
        &mut rng,
        WORD_CLASSES,
        WORDS_PER_CLASS,
        SYMBOL_WIDTH,
        1.0,
        0.25,
    );
    if config.normalize() {
        data::normalize(&mut words);
    }
    let corpus = sentences(&mut rng, SENTENCES);
    let positions = longest(&corpus);
    println!(
        "{} sentences over {} words, up to {} positions",
        corpus.len(),
        words.len(),
        positions
    );

    let mut net = Network::<f32>::positional(
        SYMBOL_WIDTH,
        POSITION_WIDTH,
        LENGTH,
        positions,
        config.softmax(),
    )?;
    net.params.initialize(config.init(), &mut rng);

    let passes = (0..positions)
        .map(|position| net.position_pass(position))
        .collect::<occam::Result<Vec<Pass>>>()?;
    let input = net
        .input
        .ok_or_else(|| Error::UnknownParameter(occam::network::INPUT.to_string()))?;

    println!("Training...");
    let train_start = Instant::now();
    let mut trainer = Trainer::new(config.adam(), config.iterations());
    let mut feed = |params: &mut ParameterSet<f32>, rng: &mut SeededRng| -> occam::Result<Pass> {
        let sentence = &corpus[rng.gen_usize(corpus.len())];
        let position = rng.gen_usize(sentence.len());
        params
            .get_mut(input)
            .assign(&words[sentence[position]].features)?;
        Ok(passes[position].clone())
    };
    let report = net.train(&mut trainer, &mut feed, &mut rng)?;
    println!(
        "Training time: {:.2} seconds",
        train_start.elapsed().as_secs_f64()
    );
    if report.diverged() {
        eprintln!("Training diverged: {:?}", report.outcome);
    }

    // Every word at every position it occurs, labelled by its word class.
    let mut rankings = Vec::new();
    let mut labels = Vec::new();
    for sentence in &corpus {
        for (position, &word) in sentence.iter().enumerate() {
            let attention = net.attention(&words[word].features, &passes[position].bindings)?;
            rankings.push(rank(&attention));
            labels.push(words[word].label.clone().unwrap_or_default());
        }
    }
    let agreement = nearest_neighbor_agreement(&rankings, &labels);
    println!("Word class agreement: {:.3}", agreement);

    fs::create_dir_all(out_dir)?;
    write_history(out_dir.join("occam_positional_loss.txt"), &report.history)?;

    Ok(Summary {
        agreement,
        initial_loss: report.initial_loss(),
        trailing_loss: report.trailing_mean(100),
        iterations: report.history.len(),
    })
}

fn main() {
    env_logger::init();
    let program_start = Instant::now();

    let args: Vec<String> = std::env::args().collect();
    let config = match config_from_args(args.get(1).map(String::as_str)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Could not load config: {}", e);
            std::process::exit(1);
        }
    };

    match run(&config, Path::new("./logs")) {
        Ok(summary) => {
            println!("\n=== Summary ===");
            println!("Iterations: {}", summary.iterations);
            println!("Agreement: {:.3}", summary.agreement);
            println!(
                "Loss: {:?} -> {:?} (mean of last 100)",
                summary.initial_loss, summary.trailing_loss
            );
            println!(
                "Total program time: {:.2} seconds",
                program_start.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            eprintln!("occam_positional failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_follow_templates() {
        let mut rng = SeededRng::new(5);
        for sentence in sentences(&mut rng, 20) {
            let classes: Vec<usize> = sentence.iter().map(|w| w / WORDS_PER_CLASS).collect();
            assert!(TEMPLATES.iter().any(|t| *t == classes.as_slice()));
        }
    }
}

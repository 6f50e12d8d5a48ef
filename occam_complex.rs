use num_complex::Complex64;
use occam::analysis::{nearest_neighbor_agreement, rank};
use occam::config::{config_from_args, TrainingConfig};
use occam::data::{self, Sample};
use occam::graph::Bindings;
use occam::network::Network;
use occam::ops::SoftmaxKind;
use occam::persist;
use occam::training::{write_history, NoFeed, Trainer};
use occam::utils::SeededRng;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Instant;

// Complex-valued weights attending over the whole dataset at once.
const CLASSES: usize = 3;
const PER_CLASS: usize = 16;
const WIDTH: usize = 4;
const SCALE: f64 = 3.0;
const SPREAD: f64 = 0.5;
const LEARNING_RATE: f64 = 0.1;
const ITERATIONS: usize = 1024;

struct Summary {
    agreement: f64,
    initial_loss: Option<f64>,
    final_loss: Option<f64>,
    iterations: usize,
}

// Ranking of the weights for every sample, read off the first attention layer.
fn rankings(net: &mut Network<Complex64>, samples: &[Sample]) -> occam::Result<Vec<Vec<usize>>> {
    let attention = net.attention(&data::flatten(samples), &Bindings::new())?;
    Ok(attention.chunks_exact(samples.len()).map(rank).collect())
}

fn run(config: &TrainingConfig, out_dir: &Path) -> Result<Summary, Box<dyn Error>> {
    let mut rng = SeededRng::new(config.seed());
    let mut samples = data::synthetic_clusters(&mut rng, CLASSES, PER_CLASS, WIDTH, SCALE, SPREAD);
    if config.normalize() {
        data::normalize(&mut samples);
    }

    // Spherical softmax and the larger step unless the config says otherwise.
    let softmax = if config.softmax.is_some() {
        config.softmax()
    } else {
        SoftmaxKind::Spherical
    };
    let mut adam = config.adam();
    if config.learning_rate.is_none() {
        adam.set_learning_rate(LEARNING_RATE);
    }
    let iterations = config.iterations.unwrap_or(ITERATIONS);

    println!("Initializing complex points from {} samples...", samples.len());
    let flat = data::flatten(&samples);
    let mut net = Network::<Complex64>::batch(WIDTH, samples.len(), softmax)?;
    net.params.get_mut(net.points).assign(&flat)?;
    net.load_sample(&flat)?;

    println!("Training...");
    let train_start = Instant::now();
    let mut trainer = Trainer::new(adam, iterations);
    let report = net.train(&mut trainer, &mut NoFeed, &mut rng)?;
    println!(
        "Training time: {:.2} seconds",
        train_start.elapsed().as_secs_f64()
    );
    if report.diverged() {
        eprintln!("Training diverged: {:?}", report.outcome);
    }

    let agreement =
        nearest_neighbor_agreement(&rankings(&mut net, &samples)?, &data::labels(&samples));
    println!("Nearest neighbour agreement: {:.3}", agreement);

    fs::create_dir_all(out_dir)?;
    write_history(out_dir.join("occam_complex_loss.txt"), &report.history)?;
    persist::save(&net.params, out_dir.join("occam_complex.bin"))?;

    Ok(Summary {
        agreement,
        initial_loss: report.initial_loss(),
        final_loss: report.final_loss(),
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
                "Loss (magnitude): {:?} -> {:?}",
                summary.initial_loss, summary.final_loss
            );
            println!(
                "Total program time: {:.2} seconds",
                program_start.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            eprintln!("occam_complex failed: {}", e);
            std::process::exit(1);
        }
    }
}

use occam::analysis::{nearest_neighbor_agreement, rank};
use occam::config::{config_from_args, TrainingConfig};
use occam::data::{self, Sample};
use occam::graph::Bindings;
use occam::network::{Network, INPUT};
use occam::persist;
use occam::training::{write_history, SampleFeed, Trainer};
use occam::utils::SeededRng;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Instant;

// Three well separated classes in four dimensions.
const CLASSES: usize = 3;
const PER_CLASS: usize = 50;
const WIDTH: usize = 4;
const SCALE: f64 = 3.0;
const SPREAD: f64 = 0.5;

struct Summary {
    agreement_before: f64,
    agreement_after: f64,
    entropy_before: f64,
    entropy_after: f64,
    iterations: usize,
}

// Fraction of samples whose nearest neighbour, by attention ranking, shares their class.
fn agreement(net: &mut Network<f32>, samples: &[Sample]) -> occam::Result<f64> {
    let bindings = Bindings::new();
    let mut rankings = Vec::with_capacity(samples.len());
    for sample in samples {
        rankings.push(rank(&net.attention(&sample.features, &bindings)?));
    }
    Ok(nearest_neighbor_agreement(&rankings, &data::labels(samples)))
}

fn mean_entropy(net: &mut Network<f32>, samples: &[Sample]) -> occam::Result<f64> {
    let bindings = Bindings::new();
    let mut total = 0.0;
    for sample in samples {
        total += net.entropy_of(&sample.features, &bindings)? as f64;
    }
    Ok(total / samples.len().max(1) as f64)
}

/// Trains the clustering network on synthetic data, writing the loss curve
/// and the learned points under `out_dir`.
fn run(config: &TrainingConfig, out_dir: &Path) -> Result<Summary, Box<dyn Error>> {
    let mut rng = SeededRng::new(config.seed());

    println!("Generating {} samples...", CLASSES * PER_CLASS);
    let mut samples = data::synthetic_clusters(&mut rng, CLASSES, PER_CLASS, WIDTH, SCALE, SPREAD);
    if config.normalize() {
        data::normalize(&mut samples);
    }

    println!("Initializing points from the data...");
    let mut net = Network::<f32>::clustering(WIDTH, samples.len(), config.softmax())?;
    net.params
        .get_mut(net.points)
        .assign(&data::flatten(&samples))?;

    let agreement_before = agreement(&mut net, &samples)?;
    let entropy_before = mean_entropy(&mut net, &samples)?;
    println!(
        "Before training: agreement {:.3}, mean entropy {:.5}",
        agreement_before, entropy_before
    );

    println!("Training...");
    let train_start = Instant::now();
    let mut trainer = Trainer::new(config.adam(), config.iterations());
    let mut feed = SampleFeed::new(&samples, INPUT, config.sampling());
    let report = net.train(&mut trainer, &mut feed, &mut rng)?;
    println!(
        "Training time: {:.2} seconds",
        train_start.elapsed().as_secs_f64()
    );
    if report.diverged() {
        eprintln!("Training diverged: {:?}", report.outcome);
    }

    let agreement_after = agreement(&mut net, &samples)?;
    let entropy_after = mean_entropy(&mut net, &samples)?;
    println!(
        "After training: agreement {:.3}, mean entropy {:.5}",
        agreement_after, entropy_after
    );

    fs::create_dir_all(out_dir)?;
    write_history(out_dir.join("occam_clusters_loss.txt"), &report.history)?;
    persist::save(&net.params, out_dir.join("occam_clusters.bin"))?;

    Ok(Summary {
        agreement_before,
        agreement_after,
        entropy_before,
        entropy_after,
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
            println!(
                "Agreement: {:.3} -> {:.3}",
                summary.agreement_before, summary.agreement_after
            );
            println!(
                "Mean entropy: {:.5} -> {:.5}",
                summary.entropy_before, summary.entropy_after
            );
            println!(
                "Total program time: {:.2} seconds",
                program_start.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            eprintln!("occam_clusters failed: {}", e);
            std::process::exit(1);
        }
    }
}

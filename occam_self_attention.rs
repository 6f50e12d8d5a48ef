use occam::analysis::rank;
use occam::config::{config_from_args, TrainingConfig};
use occam::graph::Bindings;
use occam::network::Network;
use occam::training::{write_history, NoFeed, Trainer};
use occam::utils::SeededRng;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Instant;

// Points attending over themselves.
const WIDTH: usize = 8;
const LENGTH: usize = 64;
const TOP: usize = 3;

struct Summary {
    initial_loss: Option<f64>,
    final_loss: Option<f64>,
    iterations: usize,
    diverged: bool,
}

// The `TOP` points each point attends to most.
fn strongest_links(net: &mut Network<f32>) -> occam::Result<Vec<Vec<usize>>> {
    let attention = net.graph.forward(net.l1, &net.params, &Bindings::new())?;
    Ok(attention
        .chunks_exact(LENGTH)
        .map(|row| rank(row).into_iter().take(TOP).collect())
        .collect())
}

fn run(config: &TrainingConfig, out_dir: &Path) -> Result<Summary, Box<dyn Error>> {
    let mut rng = SeededRng::new(config.seed());

    println!("Initializing {} points of width {}...", LENGTH, WIDTH);
    let mut net = Network::<f32>::self_attention(WIDTH, LENGTH, config.softmax())?;
    net.params.initialize(config.init(), &mut rng);

    println!("Training...");
    let train_start = Instant::now();
    let mut trainer = Trainer::new(config.adam(), config.iterations());
    let report = net.train(&mut trainer, &mut NoFeed, &mut rng)?;
    println!(
        "Training time: {:.2} seconds",
        train_start.elapsed().as_secs_f64()
    );
    if report.diverged() {
        eprintln!("Training diverged: {:?}", report.outcome);
    }

    for (point, links) in strongest_links(&mut net)?.iter().enumerate().take(8) {
        println!("point {:2} attends to {:?}", point, links);
    }

    fs::create_dir_all(out_dir)?;
    write_history(out_dir.join("occam_self_attention_loss.txt"), &report.history)?;

    Ok(Summary {
        initial_loss: report.initial_loss(),
        final_loss: report.final_loss(),
        iterations: report.history.len(),
        diverged: report.diverged(),
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
            println!("Diverged: {}", summary.diverged);
            println!(
                "Loss: {:?} -> {:?}",
                summary.initial_loss, summary.final_loss
            );
            println!(
                "Total program time: {:.2} seconds",
                program_start.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            eprintln!("occam_self_attention failed: {}", e);
            std::process::exit(1);
        }
    }
}

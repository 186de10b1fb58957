use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use audio_chunk_dataset::*;
use clap::{Parser, Subcommand};

/// Index audio files into fixed-length overlapping windows and extract
/// their features.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Dataset configuration (YAML). Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol file listing audio ids and their labels.
    #[arg(short, long)]
    protocol: PathBuf,

    /// Directory holding the audio files named in the protocol.
    #[arg(short, long)]
    audio_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the window index and summarise it.
    Index {
        /// Write the index entries as YAML.
        #[arg(long)]
        dump: Option<PathBuf>,
    },
    /// Materialize one window and print its feature shape.
    Features { index: usize },
    /// Materialize every window and report any that fail.
    Scan {
        /// Worker threads (defaults to num_workers from the config).
        #[arg(long)]
        workers: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DatasetConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DatasetConfig::default(),
    };
    let items = read_protocol(&args.protocol, &args.audio_dir, &config.audio_extension)
        .with_context(|| format!("reading protocol {}", args.protocol.display()))?;

    let source: Box<dyn AudioSource> = if config.cache_decoded {
        Box::new(CachedSource::new(FileSource))
    } else {
        Box::new(FileSource)
    };
    let transform = config.transform().context("building feature transform")?;
    let dataset = ChunkDataset::new(
        &items,
        config.window(),
        config.labels.clone(),
        source,
        transform,
    )?;

    match args.command {
        Command::Index { dump } => {
            for (class, count) in dataset.class_counts() {
                println!(
                    "{}: {} windows",
                    dataset.labels().name_of(class).unwrap_or("?"),
                    count
                );
            }
            let padded = dataset.entries().iter().filter(|e| e.padded).count();
            println!("total: {} windows ({} padded)", dataset.len(), padded);

            if let Some(path) = dump {
                let f = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                serde_yaml::to_writer(f, dataset.entries())?;
                log::info!("wrote index to {}", path.display());
            }
        }

        Command::Features { index } => {
            let sample = dataset.get(index)?;
            let entry = &dataset.entries()[index];
            println!(
                "window {} of {} @ sample {}{}: features {:?}, label {} ({})",
                index,
                entry.source_path.display(),
                entry.start_offset,
                if entry.padded { " (padded)" } else { "" },
                sample.features.dim(),
                sample.label,
                dataset.labels().name_of(sample.label).unwrap_or("?"),
            );
        }

        Command::Scan { workers } => {
            let workers = workers.unwrap_or(config.num_workers);
            let total = dataset.len();
            let dataset = Arc::new(dataset);
            let mut failed = 0usize;
            let prefetcher = Prefetcher::start(dataset.clone(), (0..total).collect(), workers)?;
            for (index, result) in prefetcher {
                if let Err(e) = result {
                    log::error!("window {index}: {e}");
                    failed += 1;
                }
            }
            println!("scanned {} windows, {} failed", total, failed);
            if failed > 0 {
                anyhow::bail!("{failed} windows could not be materialized");
            }
        }
    }

    Ok(())
}

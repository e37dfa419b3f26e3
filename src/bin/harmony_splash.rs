//! Command-line front end.
//!
//! - `harmony-splash train`: fit on the dataset, report metrics and importance, save
//! - `harmony-splash predict --activity Shower ...`: initialize and predict one record
//! - `harmony-splash inspect`: print the schema and metadata of a stored model
//!
//! Defaults come from the built-in configuration and `HARMONY__*` environment
//! variables; flags override both for one invocation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;

use harmony_splash::config::{AppConfig, SourceKind};
use harmony_splash::data::{InboundRecord, TrainingDataset};
use harmony_splash::model::FittedModel;
use harmony_splash::serving::ServingState;
use harmony_splash::training::{ForestConfig, MaxFeatures, Verbosity};
use harmony_splash::Result;

#[derive(Debug, Parser)]
#[command(name = "harmony-splash", version, about = "Predict desired water temperature")]
struct Cli {
    /// Log per-tree progress.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train a forest, report held-out metrics and save it.
    Train {
        #[command(flatten)]
        paths: PathArgs,
        #[command(flatten)]
        forest: ForestArgs,
        /// Do not write the model file.
        #[arg(long)]
        no_save: bool,
    },
    /// Predict the desired temperature for one record.
    Predict {
        #[command(flatten)]
        paths: PathArgs,
        #[command(flatten)]
        forest: ForestArgs,
        /// How to obtain the model.
        #[arg(long, value_enum)]
        source: Option<Source>,
        #[command(flatten)]
        record: RecordArgs,
    },
    /// Show the schema and metadata of a stored model.
    Inspect {
        /// Model file.
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct PathArgs {
    /// Training CSV.
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Model file.
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ForestArgs {
    /// Number of trees.
    #[arg(long)]
    trees: Option<u32>,
    /// Maximum tree depth.
    #[arg(long)]
    max_depth: Option<u32>,
    /// Features per split: all, sqrt, log2, a fraction or a count.
    #[arg(long)]
    max_features: Option<MaxFeatures>,
    /// Random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Fit trees one after another instead of on the thread pool.
    #[arg(long)]
    sequential: bool,
}

#[derive(Debug, Args)]
struct RecordArgs {
    #[arg(long)]
    activity: String,
    #[arg(long)]
    time_of_day: String,
    #[arg(long)]
    season: String,
    #[arg(long, allow_hyphen_values = true)]
    external_temp: String,
    #[arg(long)]
    room_temp: String,
    #[arg(long)]
    room_humidity: String,
    #[arg(long)]
    flow_rate: String,
    #[arg(long)]
    cold_water_temp: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Source {
    Train,
    Load,
    LoadOrTrain,
}

impl From<Source> for SourceKind {
    fn from(source: Source) -> Self {
        match source {
            Source::Train => SourceKind::Train,
            Source::Load => SourceKind::Load,
            Source::LoadOrTrain => SourceKind::LoadOrTrain,
        }
    }
}

impl PathArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(dataset) = &self.dataset {
            config.dataset.path = dataset.clone();
        }
        if let Some(model) = &self.model {
            config.model.path = model.clone();
        }
    }
}

impl ForestArgs {
    fn apply(&self, forest: &mut ForestConfig, verbose: bool) -> Result<()> {
        if let Some(trees) = self.trees {
            forest.n_trees = trees;
        }
        if self.max_depth.is_some() {
            forest.max_depth = self.max_depth;
        }
        if let Some(max_features) = self.max_features {
            forest.max_features = max_features;
        }
        if let Some(seed) = self.seed {
            forest.seed = seed;
        }
        if self.sequential {
            forest.parallel = false;
        }
        if verbose {
            forest.verbosity = Verbosity::Debug;
        }
        forest.validate()?;
        Ok(())
    }
}

impl RecordArgs {
    fn to_inbound(&self) -> InboundRecord {
        InboundRecord::new()
            .with("Activity", &self.activity)
            .with("TimeOfDay", &self.time_of_day)
            .with("Season", &self.season)
            .with("ExternalTemp", &self.external_temp)
            .with("RoomTemp", &self.room_temp)
            .with("RoomHumidity", &self.room_humidity)
            .with("FlowRate", &self.flow_rate)
            .with("ColdWaterTemp", &self.cold_water_temp)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error [{}]: {}", err.kind(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load()?;

    match cli.command {
        Command::Train {
            paths,
            forest,
            no_save,
        } => {
            paths.apply(&mut config);
            forest.apply(&mut config.forest, cli.verbose)?;
            train(&config, !no_save)
        }
        Command::Predict {
            paths,
            forest,
            source,
            record,
        } => {
            paths.apply(&mut config);
            forest.apply(&mut config.forest, cli.verbose)?;
            if let Some(source) = source {
                config.model.source = source.into();
            }
            let mut state = ServingState::new();
            state.initialize(&config.model_source())?;
            println!("{}", state.predict(&record.to_inbound())?);
            Ok(())
        }
        Command::Inspect { model } => {
            if let Some(model) = model {
                config.model.path = model;
            }
            inspect(&FittedModel::load(&config.model.path)?);
            Ok(())
        }
    }
}

fn train(config: &AppConfig, save: bool) -> Result<()> {
    let dataset = TrainingDataset::from_csv_path(&config.dataset.path)?;
    let (model, report) = FittedModel::train(&dataset, &config.forest)?;

    println!("rows used: {} (dropped {})", dataset.len(), dataset.n_dropped());
    println!("{report}");

    let mut importance = model.feature_importance();
    importance.sort_by(|a, b| b.1.total_cmp(&a.1));
    println!("feature importance:");
    for (name, value) in importance {
        println!("  {name:<28} {value:.4}");
    }

    if save {
        model.save(&config.model.path)?;
        info!("saved model to {}", config.model.path.display());
    }
    Ok(())
}

fn inspect(model: &FittedModel) {
    let meta = model.meta();
    println!("written by harmony-splash {}", meta.crate_version);
    println!(
        "trees: {}  rows: {}  dropped: {}",
        model.forest().n_trees(),
        meta.n_rows,
        meta.n_dropped
    );
    println!(
        "seed: {}  max_features: {}  max_depth: {}",
        meta.config.seed,
        meta.config.max_features,
        meta.config
            .max_depth
            .map_or_else(|| "none".to_string(), |d| d.to_string())
    );
    if let Some(report) = &meta.evaluation {
        println!("{report}");
    }
    println!("schema ({} columns):", model.schema().width());
    for (i, name) in model.schema().names().iter().enumerate() {
        println!("  {i:>2} {name}");
    }
}

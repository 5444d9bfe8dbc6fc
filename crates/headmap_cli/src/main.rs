pub mod config;

use crate::config::Config;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use headmap_core::{
    ConditionCategory, ConditionsMaps, CsvTableSource, HeadCell, HeadType, ProcessorChain,
    SiteMap, StaticMapsInitializer, SurfacePowerProcessor,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};

/// Head types with engine scripts, in load order
const SCRIPTED_HEAD_TYPES: [HeadType; 3] =
    [HeadType::SlowWaves, HeadType::FastWaves, HeadType::Rewards];

#[derive(Parser)]
#[command(name = "headmap")]
#[command(about = "Condition head maps from statistical engine exports")]
struct Cli {
    /// Config file (default: ~/.headmap/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config file
    InitConfig,
    /// Load symptom data and print the user symptom
    Aggregate {
        /// Head types to load, in order (default: all scripted ones)
        #[arg(long = "head-type", value_enum)]
        head_types: Vec<HeadType>,
    },
    /// Load symptom data and print one condition
    Show {
        #[arg(value_enum)]
        category: ConditionCategory,
        name: String,
    },
    /// List the declared conditions per category
    List,
}

#[derive(Serialize)]
struct HeadReport<'a> {
    name: &'a str,
    category: ConditionCategory,
    kind: HeadType,
    sites: Vec<&'a HeadCell>,
}

impl<'a> HeadReport<'a> {
    fn new(name: &'a str, category: ConditionCategory, head: &'a dyn SiteMap) -> Self {
        Self {
            name,
            category,
            kind: head.kind(),
            sites: head.sites().values().collect(),
        }
    }
}

#[derive(Serialize)]
struct CategoryListing<'a> {
    category: ConditionCategory,
    count: usize,
    names: Vec<&'a str>,
}

fn init_tracing(json: bool, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    installed.context("setting default subscriber failed")
}

fn registry(config: &Config, head_types: &[HeadType]) -> ConditionsMaps {
    let chain = head_types.iter().fold(ProcessorChain::new(), |chain, &head_type| {
        chain.push(SurfacePowerProcessor::with_rules(
            head_type,
            config.aggregation.clone(),
            CsvTableSource::new(&config.engine.table_dir),
        ))
    });

    ConditionsMaps::new(
        Box::new(StaticMapsInitializer::new(config.conditions.clone())),
        Box::new(chain),
    )
}

fn loaded_registry(config: &Config, head_types: &[HeadType]) -> Result<ConditionsMaps> {
    let mut maps = registry(config, head_types);
    maps.initialize_structure()
        .context("declaring condition structure")?;
    maps.load_data().with_context(|| {
        format!(
            "loading symptom data from {}",
            config.engine.table_dir.display()
        )
    })?;
    Ok(maps)
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing report")?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json, cli.verbose)?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    match cli.command {
        Commands::InitConfig => {
            Config::default().save(&config_path)?;
            println!("{}", config_path.display());
        }
        Commands::Aggregate { head_types } => {
            let config = Config::load(&config_path)?;
            let head_types = if head_types.is_empty() {
                SCRIPTED_HEAD_TYPES.to_vec()
            } else {
                head_types
            };
            info!(
                head_types = ?head_types,
                table_dir = %config.engine.table_dir.display(),
                "Aggregating user symptom"
            );

            let maps = loaded_registry(&config, &head_types)?;
            let user = config.aggregation.user_symptom.as_str();
            let Some(head) = maps.symptom(user) else {
                bail!("user symptom `{user}` was not created");
            };
            print_json(&HeadReport::new(user, ConditionCategory::Symptoms, head))?;
        }
        Commands::Show { category, name } => {
            let config = Config::load(&config_path)?;
            let maps = loaded_registry(&config, &SCRIPTED_HEAD_TYPES)?;
            let name = name.to_lowercase();
            let Some(head) = maps.get(category, &name) else {
                bail!("no {category} condition named `{name}`");
            };
            print_json(&HeadReport::new(&name, category, head))?;
        }
        Commands::List => {
            let config = Config::load(&config_path)?;
            let mut maps = registry(&config, &[]);
            maps.initialize_structure()
                .context("declaring condition structure")?;

            let listing: Vec<CategoryListing> = ConditionCategory::ALL
                .into_iter()
                .map(|category| CategoryListing {
                    category,
                    count: maps.count(category),
                    names: maps.names(category).collect(),
                })
                .collect();
            print_json(&listing)?;
        }
    }

    Ok(())
}

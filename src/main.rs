//! Varchain - named variable chains with Rhai-powered formulas

mod config;

use anyhow::bail;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use varchain_core::{Computed, VariableStore};
use varchain_engine::engine::{format_computed, format_value};

#[derive(Parser)]
#[command(name = "varchain")]
#[command(about = "Edit and evaluate chains of named variables")]
#[command(version)]
struct Cli {
    /// Variable file to operate on (.vars)
    #[arg(short = 'f', long = "file", global = true)]
    file: Option<PathBuf>,

    /// Config file (defaults to config.toml in the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every variable with its formula and computed value
    Show,

    /// Append a new variable
    Add { id: String, formula: String },

    /// Replace a variable's formula and recompute what depends on it
    Set { id: String, formula: String },

    /// Rename a variable, rewriting every formula that references it
    Rename { old: String, new: String },

    /// Remove a variable nothing references
    Remove { id: String },

    /// Create a Fibonacci-style chain (1, 2, then the sum of the previous two)
    Seed {
        /// Number of variables (defaults to chain_length from the config)
        #[arg(long)]
        len: Option<usize>,

        /// Identifier prefix (defaults to prefix from the config)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Evaluate a formula against the chain without storing it
    Calc { formula: String },
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn print_store(store: &VariableStore) {
    for variable in store.iter() {
        let line = format!(
            "{}: {} = {}",
            variable.id,
            variable.formula,
            format_value(&variable.value)
        );
        println!("{}", line.trim_end());
    }
}

fn print_value(store: &VariableStore, id: &str) {
    if let Some(variable) = store.get(id) {
        let line = format!("{} = {}", variable.id, format_value(&variable.value));
        println!("{}", line.trim_end());
    }
}

/// Open the store a mutating command will save back to.
fn open_for_edit(file: Option<PathBuf>) -> anyhow::Result<VariableStore> {
    let Some(path) = file else {
        bail!("no file to edit: pass -f FILE or set default_file in the config");
    };
    Ok(VariableStore::with_file(Some(path))?)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, warnings) = config::load_config(cli.config.as_deref());
    for warning in warnings {
        log::warn!("{}", warning);
    }

    let file = cli.file.or(config.default_file.clone());

    match cli.command {
        Commands::Show => {
            let store = VariableStore::with_file(file)?;
            print_store(&store);
        }
        Commands::Add { id, formula } => {
            let mut store = open_for_edit(file)?;
            let id = store.insert(&id, &formula)?;
            store.recompute_from(id.as_str())?;
            store.save_file()?;
            print_value(&store, id.as_str());
        }
        Commands::Set { id, formula } => {
            let mut store = open_for_edit(file)?;
            let recomputed = store.set_formula(&id, &formula)?;
            store.save_file()?;
            print_value(&store, &id);
            log::debug!("{} variables recomputed", recomputed.len());
        }
        Commands::Rename { old, new } => {
            let mut store = open_for_edit(file)?;
            let old_id = store.get(&old).map(|v| v.id.to_string()).unwrap_or(old.clone());
            let new_id = store.rename(&old, &new)?;
            store.recompute_from(new_id.as_str())?;
            store.save_file()?;
            println!("Renamed {} to {}", old_id, new_id);
        }
        Commands::Remove { id } => {
            let mut store = open_for_edit(file)?;
            let removed = store.remove(&id)?;
            store.save_file()?;
            println!("Removed {}", removed.id);
        }
        Commands::Seed { len, prefix } => {
            let len = len.unwrap_or(config.chain_length);
            let prefix = prefix.unwrap_or(config.prefix);
            let mut store = VariableStore::fibonacci_chain(len, &prefix)?;
            store.recompute_all();
            match file {
                Some(path) => {
                    store.save_as(&path)?;
                    println!("Seeded {} variables into {}", store.len(), path.display());
                }
                None => print_store(&store),
            }
        }
        Commands::Calc { formula } => {
            let store = VariableStore::with_file(file)?;
            let computed = store.evaluate(&formula);
            if computed == Computed::Unresolved {
                bail!("formula could not be resolved: {}", formula);
            }
            println!("{}", format_computed(&computed));
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

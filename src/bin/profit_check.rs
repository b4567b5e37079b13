// One-shot harness around the Selector-Predictor.
// Run with: cargo run --bin profit_check -- predict --restaurant R1 --category Desserts --item Cake
use clap::{Parser, Subcommand};
use profit_core::config::{parse_delimiter, Config};
use profit_core::persistence::{load_artifacts, save_artifacts};
use profit_core::{logging, SelectionState, SelectorPredictor};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about = "Query the menu reference table and profit model")]
struct Args {
    /// Reference table (overrides PROFIT_TABLE)
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    /// Model artifact bundle (overrides PROFIT_ARTIFACTS)
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    /// Single-byte table delimiter (overrides PROFIT_DELIMITER)
    #[arg(long, global = true)]
    delimiter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List restaurants, a restaurant's categories, or a category's items
    List {
        #[arg(long)]
        restaurant: Option<String>,
        #[arg(long, requires = "restaurant")]
        category: Option<String>,
    },
    /// Look up one menu item and print its profit bucket
    Predict {
        #[arg(long)]
        restaurant: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        item: String,
    },
    /// Re-encode the artifact bundle; .json writes JSON, anything else bincode
    Export { output: PathBuf },
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(table) = args.table {
        config.table_path = table;
    }
    if let Some(artifacts) = args.artifacts {
        config.artifacts_path = artifacts;
    }
    if let Some(delimiter) = args.delimiter {
        config.delimiter = parse_delimiter(&delimiter)?;
    }

    if let Command::Export { output } = &args.command {
        let artifacts = load_artifacts(&config.artifacts_path)?;
        save_artifacts(&artifacts, output)?;
        println!("Exported {} to {}", config.artifacts_path.display(), output.display());
        return Ok(());
    }

    let engine = SelectorPredictor::load(&config.table_path, &config.artifacts_path, config.delimiter)?;

    match args.command {
        Command::List { restaurant: None, .. } => {
            for id in engine.list_restaurants() {
                println!("{id}");
            }
        }
        Command::List { restaurant: Some(r), category: None } => {
            for category in engine.list_categories(&r) {
                println!("{category}");
            }
        }
        Command::List { restaurant: Some(r), category: Some(c) } => {
            for item in engine.list_items(&r, &c) {
                println!("{item}");
            }
        }
        Command::Predict { restaurant, category, item } => {
            let mut state = SelectionState::new();
            state.select_restaurant(&restaurant);
            state.select_category(&category)?;
            state.select_item(&engine, &item)?;

            let request = state.request()?;
            println!("Ingredients: {}", request.ingredients);
            println!("Price: {}", request.price);

            let result = request.run(&engine)?;
            println!("Features: {:?}", result.features.values());
            println!("Label: {} (code {})", result.label, result.label_code);
            println!("{}", result.bucket);
        }
        Command::Export { .. } => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    logging::init_stderr_logging();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("profit_check: {e}");
            ExitCode::FAILURE
        }
    }
}

use clap::Parser;
use log::{debug, info};
use pda::{
    Automaton, DefinitionLoader, Execution, PdaError, PushdownMachine, SearchBudget,
    MAX_SEARCH_DEPTH, MAX_SEARCH_STEPS,
};
use std::path::Path;
use std::process::ExitCode;

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The pushdown automaton definition file to execute
    #[clap(short, long)]
    program: String,

    /// The words to run the automaton on
    #[clap(short, long)]
    input: Vec<String>,

    /// Print the trace of each run
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print each execution as JSON
    #[clap(short, long)]
    json: bool,

    /// Maximum number of configurations visited per run
    #[clap(long, default_value_t = MAX_SEARCH_STEPS)]
    max_steps: usize,

    /// Maximum length of a single search path
    #[clap(long, default_value_t = MAX_SEARCH_DEPTH)]
    max_depth: usize,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

/// Runs every input and returns whether all of them were accepted.
fn run(cli: &Cli) -> Result<bool, PdaError> {
    let definition = DefinitionLoader::load_definition(Path::new(&cli.program))?;
    let automaton = Automaton::new(&definition)?;
    info!(
        "Loaded '{}' ({} transitions, accepting by {})",
        automaton.name(),
        automaton.transitions().len(),
        automaton.acceptance()
    );

    let budget = SearchBudget {
        max_steps: cli.max_steps,
        max_depth: cli.max_depth,
        timeout: None,
    };
    let machine = PushdownMachine::with_budget(&automaton, budget);

    // No input words means a single run on the empty word.
    let inputs = if cli.input.is_empty() {
        vec![String::new()]
    } else {
        cli.input.clone()
    };

    let mut all_accepted = true;
    for input in &inputs {
        let execution = machine.run(input);
        debug!("'{}' visited {} configurations", input, execution.steps());
        all_accepted &= execution.accepted();

        if cli.json {
            print_json(&execution)?;
        } else {
            print_execution(input, &execution, cli.debug);
        }
    }

    Ok(all_accepted)
}

fn print_json(execution: &Execution) -> Result<(), PdaError> {
    let json = serde_json::to_string_pretty(execution)
        .map_err(|e| PdaError::ValidationError(format!("Failed to serialize execution: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn print_execution(input: &str, execution: &Execution, debug: bool) {
    let word = if input.is_empty() { "ε" } else { input };

    if debug {
        println!("Input: {}", word);
        print!("{}", execution.trace());
    }

    match (execution.accepted_by(), execution.reason()) {
        (Some(accepted_by), _) => println!("{}: ACCEPTED ({})", word, accepted_by),
        (None, Some(reason)) => println!("{}: REJECTED ({})", word, reason),
        (None, None) => println!("{}: REJECTED", word),
    }

    if debug {
        println!();
    }
}

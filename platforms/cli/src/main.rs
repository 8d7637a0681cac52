mod report;

use clap::Parser;
use report::{Options, RunReport};
use std::io::{self, Read};
use std::path::Path;
use tmsim::{
    unreachable_states, Program, ProgramLoader, ProgramManager, TuringMachine,
    TuringMachineError, MAX_WINDOW_MARGIN,
};

/// Runs a one-tape, possibly non-deterministic Turing machine on input strings.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tmsim machines/anbn.tm -i aabb -i aab
  tmsim --builtin 'binary palindrome' --path
  cat machines/anbn.tm | tmsim -q")]
struct Cli {
    /// Path to a machine descriptor (.tm, .json, .yaml or .yml).
    /// Can also pipe `.tm` content via stdin.
    program_file: Option<String>,

    /// Run a bundled machine by name instead of a file.
    #[clap(short, long, conflicts_with = "program_file")]
    builtin: Option<String>,

    /// List the bundled machines and exit.
    #[clap(long)]
    list: bool,

    /// Input string to run; may be repeated. Defaults to the descriptor's `inputs:` list.
    #[clap(short, long)]
    input: Vec<String>,

    /// Maximum number of configurations explored per input.
    #[clap(short, long)]
    max_steps: Option<usize>,

    /// Worker threads; 0 uses every CPU.
    #[clap(short, long, default_value_t = 0)]
    jobs: usize,

    /// Blank cells printed around the used part of the tape (at most 4096).
    #[clap(
        short,
        long,
        default_value_t = 1,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new()
            .range(0..=MAX_WINDOW_MARGIN as u64)
    )]
    window: usize,

    /// Print only the accepting branch.
    #[clap(long)]
    path: bool,

    /// Print only the verdict of each input.
    #[clap(short, long)]
    quiet: bool,

    /// Print exploration statistics and descriptor warnings to stderr.
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print runs as JSON.
    #[clap(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.list {
        list_programs();
        return;
    }

    let program = match load_program(&cli) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if cli.debug {
        for state in unreachable_states(&program) {
            eprintln!("[debug] state '{}' is unreachable", state);
        }
    }

    let machine = match TuringMachine::new(program) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let machine = match cli.max_steps {
        Some(bound) => machine.with_step_bound(bound),
        None => machine,
    };

    let inputs = if cli.input.is_empty() {
        machine.program().inputs.clone()
    } else {
        cli.input.clone()
    };

    if inputs.is_empty() {
        eprintln!("Error: no input strings; pass --input or add an `inputs:` section");
        std::process::exit(1);
    }

    let options = Options {
        margin: cli.window,
        path_only: cli.path,
        quiet: cli.quiet,
    };
    let results = machine.run_all(&inputs, cli.jobs);

    if cli.json {
        let reports: Vec<RunReport> = inputs
            .iter()
            .zip(&results)
            .map(|(input, result)| RunReport::new(input, result, &options))
            .collect();

        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        for result in &results {
            match result {
                Ok(run) => print!("{}", report::render_run(run, &options)),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }

    if cli.debug {
        for run in results.iter().flatten() {
            eprintln!("{}", report::render_stats(run));
        }
    }
}

/// Loads the descriptor from a file, a bundled machine, or piped stdin, in that order.
fn load_program(cli: &Cli) -> Result<Program, TuringMachineError> {
    if let Some(file_path) = &cli.program_file {
        ProgramLoader::load_program(Path::new(file_path))
    } else if let Some(name) = &cli.builtin {
        ProgramManager::get_program_by_name(name)
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| {
                TuringMachineError::FileError(format!("Failed to read from stdin: {}", e))
            })?;
        ProgramLoader::load_program_from_string(&buffer)
    } else {
        Err(TuringMachineError::FileError(
            "No program given; pass a file, --builtin NAME, or pipe a descriptor (see --list)"
                .to_string(),
        ))
    }
}

fn list_programs() {
    for index in 0..ProgramManager::get_program_count() {
        if let Ok(info) = ProgramManager::get_program_info(index) {
            println!(
                "{:<20} {} states, {} transitions, {}",
                info.name,
                info.state_count,
                info.transition_count,
                if info.deterministic {
                    "deterministic"
                } else {
                    "non-deterministic"
                }
            );
        }
    }
}

use clap::Parser;
use fixcalc::session::{Calculator, Config, OutputFormat, DEFAULT_MAX_INPUT_LEN, OUTPUT_ENV};
use log::debug;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

/// Reads one expression per line from stdin and prints each result.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// How results are printed: `raw` (the 64-bit encoding) or `decimal`
    #[arg(long, env = OUTPUT_ENV, default_value = "raw")]
    output: OutputFormat,

    /// Shorthand for `--output decimal`; takes precedence over `--output`
    #[arg(long)]
    decimal: bool,

    /// Requests of this many bytes or more are rejected
    #[arg(long, default_value_t = DEFAULT_MAX_INPUT_LEN)]
    max_input_len: usize,

    /// Start every line with an empty variable table
    #[arg(long)]
    fresh_variables: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            max_input_len: self.max_input_len,
            output: if self.decimal {
                OutputFormat::Decimal
            } else {
                self.output
            },
            keep_variables: !self.fresh_variables,
        }
    }
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    let args = Args::parse();
    let config = args.config();
    debug!("Starting with {:?}", config);

    match run(Calculator::new(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fixcalc: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(mut calculator: Calculator) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match calculator.write(line.as_bytes()) {
            Ok(_) => stdout.write_all(calculator.read().as_bytes())?,
            Err(e) => eprintln!("fixcalc: {}", e),
        }
        stdout.flush()?;
    }
    Ok(())
}

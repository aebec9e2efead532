//! Command line entry point.

use topoedit_cli::{CliError, parse_args, run};

fn main() {
    env_logger::init();
    log::info!("Starting topoedit");

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        log::error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

//! Provides the main entry point to the program.
use anyhow::Result;
use broadband_rollout::cli::run_cli;
use broadband_rollout::log;
use human_panic::setup_panic;

fn main() -> Result<()> {
    setup_panic!();

    if let Err(err) = run_cli() {
        if log::is_logger_initialised() {
            ::log::error!("{err:?}");
        } else {
            eprintln!("Error: {err:?}");
        }

        // Terminate program, signalling an error
        std::process::exit(1);
    }

    Ok(())
}

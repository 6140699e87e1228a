use std::process::ExitCode;

use clap::Parser;
use log::error;

mod bundle;
mod error;
mod logging;

/// Exit status for usage errors and unreadable input.
const USAGE_EXIT: u8 = 1;

#[derive(Parser)]
#[command(name = "mkcabundle", version)]
#[command(
    about = "Make a CA bundle from Mozilla certificate data (certdata.txt)",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    config: bundle::Config,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            e.print().ok();
            return if e.use_stderr() {
                ExitCode::from(USAGE_EXIT)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init();

    match bundle::execute(cli.config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

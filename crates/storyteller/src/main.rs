use std::process::ExitCode;

use clap::Parser;
use story_stream::logging::init_logging;
use story_stream::EnvConfig;
use storyteller::{run, Cli, Outcome};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env = EnvConfig::from_env();
    init_logging(env.log_filter.as_deref());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("storyteller: failed to start runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli, env)) {
        Ok(outcome) => {
            match &outcome {
                Outcome::Failed(reason) => eprintln!("storyteller: {reason}"),
                Outcome::Cancelled => eprintln!("storyteller: cancelled"),
                Outcome::Finished { .. } | Outcome::Listed => {}
            }
            ExitCode::from(outcome.exit_code())
        }
        Err(error) => {
            eprintln!("storyteller: {error}");
            ExitCode::from(2)
        }
    }
}

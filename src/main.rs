use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use twinbranch::cli::{self, Cli};
use twinbranch::engine::WorkflowError;
use twinbranch::ui::output::{self, Verbosity};

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(Verbosity::from_flags(cli.silent, cli.verbose));

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{err:#}"));
            let code = err
                .chain()
                .find_map(|cause| cause.downcast_ref::<WorkflowError>())
                .map(WorkflowError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the flag-derived level.
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

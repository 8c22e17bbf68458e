use console::style;
use gitpulse::cli::Cli;
use gitpulse::error::PulseError;
use gitpulse::logging::setup_logger;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logger(cli.common.verbose, cli.common.quiet);

    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", style("error:").red().bold(), err);
            let pulse = err.chain().find_map(|e| e.downcast_ref::<PulseError>());
            if let Some(hint) = pulse.and_then(PulseError::hint) {
                eprintln!("{} {}", style("hint:").yellow().bold(), hint);
            }
            match pulse {
                Some(e) if e.is_soft() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

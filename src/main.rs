use clap::Parser;
use ontology_conformance::{
    CliArgs, Command, LoggingConfig, ReturnCode, ValidatorConfig, init_logging, run,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(ReturnCode::GeneralError.exit_status())
        }
    }
}

fn try_main() -> anyhow::Result<ExitCode> {
    let cli = CliArgs::parse();
    let config = ValidatorConfig::from_args(&cli)?;

    // Held until exit so buffered log lines are flushed
    let _guard = init_logging(LoggingConfig::from_env().with_verbose(config.verbose))?;

    let result = run(&config, &cli.command)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if cli.command == Command::Domains {
        println!("{}", result.report_text());
    } else {
        println!("{}", result.to_string().trim_end());
    }

    Ok(ExitCode::from(result.return_code().exit_status()))
}

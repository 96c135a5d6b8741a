mod commands;
mod terminal;

use clap::Parser;
use clap::error::ErrorKind;
use commands::{CommandLine, enumerate};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = CommandLine::try_parse();

    let verbosity = parsed.as_ref().map(|cmd| cmd.verbose).unwrap_or(0);
    logging::init_logging(verbosity);

    let commands = match parsed {
        Ok(commands) => commands,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp => {
                print::banner(false);
                let _ = err.print();
                std::process::exit(0);
            }
            ErrorKind::MissingRequiredArgument => {
                print::missing_domain();
                print::banner(false);
                std::process::exit(1);
            }
            _ => err.exit(),
        },
    };

    let cfg = commands.to_config()?;

    print::banner(cfg.quiet);
    enumerate::enumerate(commands.domain, &cfg).await
}

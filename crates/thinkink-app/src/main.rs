//! Command-line entry point.

use thinkink_app::{AppError, Cli, USAGE};

fn main() {
    env_logger::init();

    let cli = match Cli::parse(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = thinkink_app::run(cli) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        let code = if matches!(e, AppError::Usage(_)) { 2 } else { 1 };
        std::process::exit(code);
    }
}

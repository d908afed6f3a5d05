use anyhow::Result;
use lined::cli::{self, Args};
use lined::config::{self, Config};
use lined::{logger, EdError, Session, SessionOptions};
use std::io;

fn main() -> Result<()> {
    let args = cli::parse_args();

    let config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: {:#}; using default configuration", e);
        Config::default()
    });

    if let Some(log_path) = logger::init_debug_logging(config.logging.debug)? {
        tracing::info!(log = %log_path.display(), "debug logging enabled");
    }

    edit(args, SessionOptions::from(&config))
}

fn edit(args: Args, options: SessionOptions) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut session = Session::new(stdin.lock(), stdout.lock(), options);

    if let Some(path) = &args.file {
        session.open(&path.to_string_lossy())?;
    }

    match session.run() {
        Ok(()) | Err(EdError::InputExhausted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

use tracing_subscriber::{EnvFilter, fmt};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output only.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let code = churchman::cli::run(std::env::args().collect())?;
    std::process::exit(code);
}

use lb_console::backends::BackendsView;
use lb_console::config::Config;
use lb_console::{App, AppView};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = Config::load()?;
    init_tracing(&config)?;

    let terminal = ratatui::init();
    let app = App::with_config(config, AppView::Backends(BackendsView::Browse));
    let result = app.run(terminal).await;
    ratatui::restore();
    result
}

/// Logs go to the configured file, the terminal belongs to the UI.
fn init_tracing(config: &Config) -> color_eyre::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lb_console=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

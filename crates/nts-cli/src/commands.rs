use colored::Colorize;
use nts_server::{init_logging, NotesServer, ServerConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args, cli.verbose),
        Command::Config(args) => cmd_config(args, cli.format),
    }
}

fn cmd_serve(args: ConfigArgs, verbose: bool) -> anyhow::Result<()> {
    let config = args.resolve()?;
    init_logging(&config.log, verbose)?;

    println!(
        "{} Serving notes on {} ({} backend, first id {})",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        config.backend.to_string().cyan(),
        config.initial_id.to_string().yellow(),
    );
    if let Some(path) = config.log.file_path() {
        println!("  Log file: {}", path.display().to_string().dimmed());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(NotesServer::from_config(config).serve(shutdown_signal()))?;
    println!("{} Server stopped.", "✓".green());
    Ok(())
}

fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = args.resolve()?;
    print!("{}", render_config(&config, &format)?);
    Ok(())
}

fn render_config(config: &ServerConfig, format: &OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Text => config.to_toml_string()?,
        OutputFormat::Json => serde_json::to_string_pretty(config)? + "\n",
    })
}

/// Resolves on Ctrl+C. If the handler cannot be installed the server runs
/// until killed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("interrupt received, shutting down"),
        Err(e) => {
            tracing::error!("cannot listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    }
}

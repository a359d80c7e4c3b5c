use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lisu::app::AppContext;
use lisu::cli::{commands, Cli, Commands, ServerAction};
use lisu::config::Config;
use lisu::domain::ReadingPosition;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Server { action } => match action {
            ServerAction::List => commands::list_servers(&ctx)?,
            ServerAction::Add { name, address } => commands::add_server(&ctx, &name, &address)?,
            ServerAction::Rename { id, name } => commands::rename_server(&ctx, id, &name)?,
            ServerAction::Remove { id } => commands::remove_server(&ctx, id)?,
            ServerAction::Move { id, position } => commands::move_server(&ctx, id, position)?,
        },
        Commands::Providers { server } => {
            commands::list_providers(&ctx, server).await?;
        }
        Commands::Popular {
            provider,
            pages,
            server,
        } => {
            commands::popular(&ctx, server, &provider, pages).await?;
        }
        Commands::Latest {
            provider,
            options,
            pages,
            server,
        } => {
            commands::latest(&ctx, server, &provider, &options, pages).await?;
        }
        Commands::Search {
            provider,
            keywords,
            pages,
            server,
        } => {
            commands::search(&ctx, server, &provider, &keywords, pages).await?;
        }
        Commands::Read {
            provider,
            manga,
            chapter,
            page,
            collection,
            server,
        } => {
            let position = ReadingPosition::new(collection, chapter, page);
            commands::record_reading(&ctx, server, &provider, &manga, position).await?;
        }
        Commands::History { server } => {
            commands::show_history(&ctx, server)?;
        }
        Commands::ClearHistory { server } => {
            commands::clear_history(&ctx, server)?;
        }
        Commands::Download {
            url,
            output,
            server,
        } => {
            commands::download(&ctx, server, &url, &output).await?;
        }
    }

    Ok(())
}

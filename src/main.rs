use anyhow::Result;
use clap::Parser;
use discogs_pg::config::POOL_MAX_CONNECTIONS;
use discogs_pg::pipeline;
use indicatif::{ProgressBar, ProgressStyle};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "discogs-pg", about = "Load a Discogs XML dump into PostgreSQL")]
struct Cli {
    /// Dump file to import, e.g. discogs_202403_artists.xml.gz
    file: PathBuf,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();

    let pool = PgPoolOptions::new()
        .max_connections(POOL_MAX_CONNECTIONS)
        .connect(&args.database_url)
        .await?;

    let start = Instant::now();
    let pb = make_spinner(&format!("Importing {} ...", args.file.display()));
    let outcome = pipeline::run_import(&pool, &args.file).await;
    pb.finish_and_clear();

    let counts = outcome?;
    for count in &counts {
        println!("    {:<32} {} rows", count.table, count.rows);
    }
    println!("Processed dump in {:.2}s.", start.elapsed().as_secs_f64());

    Ok(())
}

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

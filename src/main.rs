use appdash::api::GalleryClient;
use appdash::charts::ChartRegistry;
use appdash::config::AppConfig;
use appdash::format::{format_number, format_size, render_stars};
use appdash::history::{self, TrendOutcome};
use appdash::server::{self, handler::DashState};
use appdash::view::TableState;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[derive(Parser)]
#[command(name = "appdash", about = "App gallery dashboard service")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the dashboard HTTP server (default)
    Serve,
    /// Print the download trend for a package
    Trend {
        pkg_name: String,
        /// Emit the raw series as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print catalog totals, rating distribution and the top downloads
    Overview,
    /// Print one page of the app table
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value = "download_count")]
        sort: String,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
        #[arg(long)]
        search: Option<String>,
        /// Field to search on
        #[arg(long, default_value = "name")]
        key: String,
        #[arg(long)]
        exact: bool,
    },
    /// Print the download ranking
    Top {
        #[arg(long)]
        limit: Option<u32>,
        /// Exclude apps matching this pattern
        #[arg(long)]
        exclude: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "appdash=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(Some(&cli.config))?;

    if let Err(msg) = config.validate() {
        eprintln!("Configuration error: {msg}");
        return Err(msg.into());
    }

    let client = GalleryClient::new(&config.upstream)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, client).await,
        Command::Trend { pkg_name, json } => print_trend(&client, &pkg_name, json).await,
        Command::Overview => print_overview(&client, &config).await,
        Command::List {
            page,
            sort,
            asc,
            search,
            key,
            exact,
        } => {
            let mut table = TableState::new(config.dashboard.page_size);
            table.sort.field = sort;
            table.sort.desc = !asc;
            if let Some(term) = search {
                table.set_search(&term, &key, exact);
            }
            table.page = page.max(1);
            print_table(&client, &mut table).await
        }
        Command::Top { limit, exclude } => {
            let limit = limit.unwrap_or(config.dashboard.ranking_limit);
            let exclude = exclude.or(config.dashboard.ranking_exclude_pattern.clone());
            print_ranking(&client, limit, exclude.as_deref()).await
        }
    }
}

async fn serve(config: AppConfig, client: GalleryClient) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        upstream = %config.upstream.base_url,
        "starting appdash"
    );

    let charts = Arc::new(ChartRegistry::new());
    let state = Arc::new(DashState::new(client, charts, config.dashboard.clone()));
    let app = server::build_router(state, &config.server)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }

    tracing::info!("shutting down...");
}

async fn print_trend(
    client: &GalleryClient,
    pkg_name: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = match client.metrics_history(pkg_name).await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("failed to load download history for {pkg_name}: {e}");
            return Err(e.into());
        }
    };
    let outcome = history::build_trend(&history::samples_from_records(&records));

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let trend = match outcome {
        TrendOutcome::NoHistory => {
            println!("{pkg_name}: no historical data");
            return Ok(());
        }
        TrendOutcome::Trend(trend) => trend,
    };

    println!("{pkg_name}");
    println!(
        "{:<17} {:>14} {:>10} {:>10}",
        "time", "downloads", "increment", "per hour"
    );
    let s = &trend.series;
    for ((d, inc), hourly) in s.downloads.iter().zip(&s.increments).zip(&s.hourly_increments) {
        let ts = chrono::DateTime::from_timestamp_millis(d.x)
            .map(|t| appdash::format::format_timestamp(&t))
            .unwrap_or_else(|| d.x.to_string());
        println!(
            "{:<17} {:>14} {:>10} {:>10}",
            ts,
            format_number(d.y),
            format_number(inc.y),
            format_number(hourly.y)
        );
    }
    let summary = &trend.summary;
    println!(
        "gain {} over {:.1}h, mean {:.1}/h",
        format_number(summary.total_gain),
        summary.span_hours,
        summary.mean_hourly_rate
    );
    Ok(())
}

async fn print_overview(
    client: &GalleryClient,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let (market, stars, top) = futures::future::try_join3(
        client.market_info(),
        client.star_distribution(),
        client.top_downloads(10, config.dashboard.ranking_exclude_pattern.as_deref()),
    )
    .await?;

    println!("total      {}", format_number(market.app_count.total));
    println!("apps       {}", format_number(market.app_count.apps));
    println!("atomic     {}", format_number(market.app_count.atomic_services));
    println!("developers {}", format_number(market.developer_count));
    println!();
    let total = stars.total().max(1) as f64;
    for (i, count) in stars.counts().iter().enumerate() {
        println!(
            "{}★ {:>10} {:>5.1}%",
            i + 1,
            format_number(*count),
            *count as f64 * 100.0 / total
        );
    }
    println!();
    for (rank, entry) in top.iter().enumerate() {
        println!(
            "{:>2}. {:<30} {:>16}",
            rank + 1,
            entry.name,
            format_number(entry.download_count)
        );
    }
    Ok(())
}

async fn print_table(
    client: &GalleryClient,
    table: &mut TableState,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = client.app_list(table.page, &table.to_query()).await?;
    table.apply_page(&page);

    for row in &page.data {
        let rating = row.rating.as_ref().and_then(|r| r.average_rating);
        println!(
            "{:<30} {:<24} {:>16} {:>10}  {}",
            row.info.name,
            row.info.developer_name.as_deref().unwrap_or("-"),
            format_number(row.metric.download_count),
            format_size(row.metric.size_bytes),
            render_stars(rating)
        );
    }
    println!(
        "page {}/{} ({} apps)",
        table.page,
        table.total_pages,
        page.total_count
    );
    Ok(())
}

async fn print_ranking(
    client: &GalleryClient,
    limit: u32,
    exclude: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = client.top_downloads(limit, exclude).await?;
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}. {:<30} {:<28} {:>16}",
            rank + 1,
            entry.name,
            entry.pkg_name.as_deref().unwrap_or("-"),
            format_number(entry.download_count)
        );
    }
    Ok(())
}

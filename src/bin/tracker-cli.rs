use clap::{Parser, Subcommand};
use serde_json::Value;

use request_tracker::admin::{ActiveTasksResponse, CompletedTasksResponse};
use request_tracker::task::HttpTask;

#[derive(Parser)]
#[command(name = "tracker-cli")]
#[command(about = "Monitoring client for the request tracker API", long_about = None)]
struct Cli {
    /// Tracker endpoint URL.
    #[arg(short, long, default_value = "http://localhost:8080/tracker")]
    url: String,

    /// API key.
    #[arg(short, long, env = "TOP_WEB_API_KEY")]
    key: String,

    /// Print the raw JSON instead of a table.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List requests that are in flight
    Active,
    /// List recently completed requests, newest first
    Completed {
        /// Show at most this many entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let action = match cli.command {
        Commands::Active => "active_tasks",
        Commands::Completed { .. } => "completed_tasks",
    };

    let res = client
        .get(&cli.url)
        .query(&[("api-key", cli.key.as_str()), ("action", action)])
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: tracker API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let body = res.text().await?;
    if cli.json {
        let json: Value = serde_json::from_str(&body)?;
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    match cli.command {
        Commands::Active => {
            let tasks: ActiveTasksResponse = serde_json::from_str(&body)?;
            print_tasks(tasks.values());
        }
        Commands::Completed { limit } => {
            let tasks: CompletedTasksResponse = serde_json::from_str(&body)?;
            let limit = limit.unwrap_or(tasks.len());
            print_tasks(tasks.iter().take(limit));
        }
    }

    Ok(())
}

fn print_tasks<'a>(tasks: impl Iterator<Item = &'a HttpTask>) {
    println!(
        "{:>6}  {:<7}  {:<32}  {:>6}  {:<24}  {}",
        "ID", "METHOD", "PATH", "STATUS", "STARTED", "CLIENT"
    );
    for task in tasks {
        let status = task
            .status_code
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<7}  {:<32}  {:>6}  {:<24}  {}",
            task.task.task_id.to_string(),
            task.method,
            task.path,
            status,
            task.task.started_at,
            task.client_ip_address.as_deref().unwrap_or("-"),
        );
    }
}

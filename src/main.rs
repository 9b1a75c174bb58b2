use clap::Parser;
use cosmos_rag::application::ask::AskOptions;
use cosmos_rag::application::ingest::IngestOptions;
use cosmos_rag::cli::commands::{Cli, Commands};
use cosmos_rag::config::AppConfig;
use cosmos_rag::CosmosRag;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli);

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let rag = match CosmosRag::connect(&config).await {
        Ok(rag) => rag,
        Err(e) => {
            eprintln!("Error initializing cosmos-rag: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(rag, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(rag: CosmosRag, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::CreateIndex => {
            rag.create_indexes().await?;
            println!("Vector indexes ready");
        }
        Commands::Load { file, fields, id_field } => {
            let options = IngestOptions { fields, id_field };
            let report = rag.load_file(&file, &options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Search { query, limit } => {
            let hits = rag.search(&query, limit).await?;
            let rows: Vec<serde_json::Value> = hits
                .iter()
                .map(|h| serde_json::json!({ "score": h.score, "document": h.item.display_json() }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::Ask { question, session, limit, no_cache } => {
            let options = AskOptions { session_id: session, limit, use_cache: !no_cache };
            let answer = rag.ask(&question, &options).await?;
            println!("{}", answer.content);
        }
        Commands::Chat { session, limit, no_cache } => {
            let options = AskOptions { session_id: session, limit, use_cache: !no_cache };
            chat_loop(&rag, &options).await?;
        }
        Commands::History { session, limit } => {
            let turns = rag.history(&session, limit).await?;
            println!("{}", serde_json::to_string_pretty(&turns)?);
        }
        Commands::CacheClear => {
            let removed = rag.clear_cache().await?;
            println!("Removed {removed} cache entries");
        }
        Commands::Count => {
            println!("{}", rag.count().await?);
        }
    }
    Ok(())
}

async fn chat_loop(rag: &CosmosRag, options: &AskOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("Ask a question (type `exit` to leave)");
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit" | "end") {
            break;
        }
        match rag.ask(question, options).await {
            Ok(answer) if answer.cached => println!("{}\n(cached)", answer.content),
            Ok(answer) => println!("{}", answer.content),
            // One failed question shouldn't end the session.
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    Ok(())
}

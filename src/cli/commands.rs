use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cosmos-rag", about = "Retrieval-augmented chat over Azure Cosmos DB vector search")]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the vector indexes for the item and cache collections
    CreateIndex,
    /// Embed and load a JSON file of items
    Load {
        /// JSON array of objects, or an object with an `items` array
        file: PathBuf,
        /// Comma-separated fields to embed (default: every string field)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Field holding the item id
        #[arg(long, default_value = "id")]
        id_field: String,
    },
    /// Vector search over loaded items
    Search {
        query: String,
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// Answer a question from retrieved items
    Ask {
        question: String,
        #[arg(long, default_value = "default")]
        session: String,
        /// Items retrieved into the prompt
        #[arg(long, default_value = "3")]
        limit: usize,
        /// Skip the semantic cache lookup
        #[arg(long)]
        no_cache: bool,
    },
    /// Interactive question loop; type `exit` to leave
    Chat {
        #[arg(long, default_value = "default")]
        session: String,
        #[arg(long, default_value = "3")]
        limit: usize,
        #[arg(long)]
        no_cache: bool,
    },
    /// Show the chat history of a session
    History {
        session: String,
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Delete every semantic cache entry
    CacheClear,
    /// Count loaded items
    Count,
}

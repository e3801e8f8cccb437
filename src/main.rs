use clap::{Parser, Subcommand};

mod auth;
mod chats;
mod cli;
mod config;
mod corpus;
mod crypto;
mod error;
mod llm;
mod matcher;
mod resources;
mod store;
mod types;
mod vectorizer;

#[derive(Parser)]
#[command(name = "haven")]
#[command(version)]
#[command(about = "Mental health support chat with mood-based recommendations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a .haven directory
    Init {
        /// Directory to initialize .haven in
        #[arg(short, long, default_value = ".")]
        path: String,
    },

    /// Start an interactive support chat
    Chat {
        /// Resume an existing chat by id
        #[arg(short, long)]
        chat: Option<String>,
    },

    /// Get coping-tip recommendations for how you're feeling
    Recommend {
        /// How you're feeling, in your own words
        feeling: String,

        /// Maximum recommendations
        #[arg(short = 'n', long, default_value = "3")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List chats, or show one chat's messages
    History {
        /// Chat id (omit to list chats)
        chat: Option<String>,

        /// Maximum chats to list
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Delete a chat and its messages
    Delete {
        /// Chat id to delete
        chat: String,

        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Export chats to stdout
    Export {
        /// Output format
        #[arg(short, long, default_value = "json", value_parser = ["json", "md"])]
        format: String,
    },

    /// Show usage statistics
    Stats {
        /// Limit to the trailing number of days
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Show verified mental health resources
    Resources {
        /// Mood to look up targeted resources for
        mood: Option<String>,
    },

    /// Show the loaded recommendation corpus
    Corpus,

    /// View or set configuration
    Config {
        /// Config key
        key: Option<String>,

        /// Config value
        value: Option<String>,

        /// Write to the global config instead of this haven
        #[arg(short, long)]
        global: bool,

        /// List available matcher strategies
        #[arg(long)]
        list_strategies: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { path } => cli::chat::run_init(&path),
        Commands::Chat { chat } => cli::chat::run_chat(chat.as_deref()),
        Commands::Recommend {
            feeling,
            limit,
            json,
        } => cli::recommend::run_recommend(&feeling, limit, json),
        Commands::History { chat, limit } => cli::chat::run_history(chat.as_deref(), limit),
        Commands::Delete { chat, force } => cli::chat::run_delete(&chat, force),
        Commands::Export { format } => cli::chat::run_export(&format),
        Commands::Stats { days } => cli::stats::run_stats(days),
        Commands::Resources { mood } => cli::recommend::run_resources(mood.as_deref()),
        Commands::Corpus => cli::recommend::run_corpus(),
        Commands::Config {
            key,
            value,
            global,
            list_strategies,
        } => cli::config::run_config(key.as_deref(), value.as_deref(), global, list_strategies),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

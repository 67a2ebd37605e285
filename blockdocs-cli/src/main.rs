//! Blockdocs CLI - pack, inspect and export block documents

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "blockdocs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack an HTML file into a document container
    Pack {
        /// Input markup file
        input: String,

        /// Output container path
        #[arg(short, long)]
        output: String,

        /// Document title (defaults to the input file name)
        #[arg(long)]
        title: Option<String>,

        /// Author shown on the cover
        #[arg(long)]
        author: Option<String>,

        /// Cover configuration (cover.json)
        #[arg(long)]
        cover: Option<String>,
    },

    /// Display information about a document container
    Info {
        /// Input file path
        input: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a document container
    Validate {
        /// Input file path
        input: String,

        /// Also check entry order and the uncompressed mimetype
        #[arg(long)]
        strict: bool,
    },

    /// Export a container or HTML file as a Word document
    Export {
        /// Input file path (.epub or .html)
        input: String,

        /// Output .docx path
        #[arg(short, long)]
        output: String,
    },

    /// Render a cover image
    Cover {
        /// Title drawn on the cover
        #[arg(long)]
        title: String,

        /// Author drawn below the title
        #[arg(long)]
        author: Option<String>,

        /// Cover configuration (cover.json)
        #[arg(long)]
        config: Option<String>,

        /// Output JPEG path
        #[arg(short, long)]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "blockdocs_cli=debug,blockdocs_core=debug"
    } else {
        "blockdocs_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Pack {
            input,
            output,
            title,
            author,
            cover,
        } => commands::pack(&input, &output, title, author, cover.as_deref()).await,

        Commands::Info { input, json } => commands::info(&input, json).await,

        Commands::Validate { input, strict } => commands::validate(&input, strict),

        Commands::Export { input, output } => commands::export(&input, &output).await,

        Commands::Cover {
            title,
            author,
            config,
            output,
        } => commands::cover(&title, author.as_deref(), config.as_deref(), &output).await,
    }
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line access to a CouchDB-style database server
#[derive(Debug, Parser)]
#[command(name = "couchwire", version)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "couchwire.json")]
    pub config: PathBuf,

    /// Server URL, overrides the config file
    #[arg(long, env = "COUCHWIRE_URL")]
    pub url: Option<String>,

    /// Basic auth user name
    #[arg(long, env = "COUCHWIRE_USER")]
    pub user: Option<String>,

    /// Basic auth password
    #[arg(long, env = "COUCHWIRE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the server welcome document
    Info,

    /// List all databases
    Dbs,

    /// Create a database
    CreateDb { db: String },

    /// Delete a database
    DeleteDb { db: String },

    /// Show database information
    DbInfo { db: String },

    /// Fetch a document
    Get { db: String, id: String },

    /// Create or update a document from a JSON object
    Put {
        db: String,

        /// Document JSON; `_id` may be omitted
        json: String,
    },

    /// Delete a document revision
    Delete {
        db: String,
        id: String,

        /// Revision to delete; fetched when omitted
        #[arg(long)]
        rev: Option<String>,
    },

    /// Query `_all_docs`
    AllDocs {
        db: String,

        /// Query arguments as name=value, value parsed as JSON when possible
        #[arg(short = 'a', long = "arg", value_name = "NAME=VALUE")]
        args: Vec<String>,
    },

    /// Query a view
    View {
        db: String,
        design: String,
        view: String,

        /// Query arguments as name=value, value parsed as JSON when possible
        #[arg(short = 'a', long = "arg", value_name = "NAME=VALUE")]
        args: Vec<String>,
    },

    /// Fetch server-generated UUIDs
    Uuids {
        #[arg(default_value_t = 1)]
        count: u32,
    },
}

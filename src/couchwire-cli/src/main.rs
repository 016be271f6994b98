use anyhow::{bail, Context, Result};
use clap::Parser;
use couchwire_rs::{Client, ClientConfig, Document, ViewArgs};
use serde_json::Value;
use std::path::Path;

mod cli;
mod telemetry;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        ClientConfig::load(&cli.config)
            .with_context(|| format!("Failed to load {}", cli.config.display()))?
    } else {
        ClientConfig::default()
    };
    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(user) = &cli.user {
        config.username = Some(user.clone());
    }
    if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }

    let _guard = telemetry::init_telemetry(cli.verbose, config.log_dir.as_deref().map(Path::new))?;
    tracing::debug!(url = %config.url, timeout_secs = config.timeout_secs, "couchwire starting");

    let client = Client::from_config(&config).context("Invalid server configuration")?;
    let output = run(&client, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

async fn run(client: &Client, command: Command) -> Result<Value> {
    let output = match command {
        Command::Info => serde_json::to_value(client.server_info().await?)?,
        Command::Dbs => serde_json::to_value(client.all_dbs().await?)?,
        Command::CreateDb { db } => {
            client.create_database(db).await?;
            serde_json::json!({ "ok": true })
        }
        Command::DeleteDb { db } => {
            client.delete_database(&db).await?;
            serde_json::json!({ "ok": true })
        }
        Command::DbInfo { db } => serde_json::to_value(client.database(db)?.info().await?)?,
        Command::Get { db, id } => serde_json::to_value(client.database(db)?.get(&id).await?)?,
        Command::Put { db, json } => {
            let mut doc: Document =
                serde_json::from_str(&json).context("Document must be a JSON object")?;
            serde_json::to_value(client.database(db)?.save(&mut doc).await?)?
        }
        Command::Delete { db, id, rev } => {
            let db = client.database(db)?;
            let rev = match rev {
                Some(rev) => rev,
                None => db
                    .get(&id)
                    .await?
                    .rev()
                    .map(str::to_string)
                    .context("Server returned a document without _rev")?,
            };
            serde_json::to_value(db.delete(&id, &rev).await?)?
        }
        Command::AllDocs { db, args } => {
            let args = parse_view_args(&args)?;
            serde_json::to_value(client.database(db)?.all_docs(&args).await?)?
        }
        Command::View {
            db,
            design,
            view,
            args,
        } => {
            let args = parse_view_args(&args)?;
            serde_json::to_value(
                client
                    .database(db)?
                    .query_view(&design, &view, &args)
                    .await?,
            )?
        }
        Command::Uuids { count } => serde_json::to_value(client.uuids(count).await?)?,
    };
    Ok(output)
}

/// Parse `name=value` pairs; values that are not valid JSON are taken as strings
fn parse_view_args(pairs: &[String]) -> Result<ViewArgs> {
    let mut args = ViewArgs::new();
    for pair in pairs {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("Expected NAME=VALUE, got '{pair}'");
        };
        let value: Value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        args = args.set(name, value);
    }
    Ok(args)
}

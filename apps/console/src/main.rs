use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    sign_in, sign_up, ClientError, DirectoryStore, EmployeeApiClient, SessionCredentials,
};
use secrecy::SecretString;
use shared::domain::{EmployeeDraft, EmployeeId, EmployeeRecord};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod config;
mod session;

use config::load_settings;
use session::SessionFile;

#[derive(Parser, Debug)]
#[command(name = "employee-console", about = "Manage employee records over the REST API")]
struct Cli {
    /// Config file; defaults to ./employee-console.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured API base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "EMPLOYEE_CONSOLE_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug, Default)]
struct EmployeeFields {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    birth_date: Option<String>,
}

impl EmployeeFields {
    fn apply_to(self, mut draft: EmployeeDraft) -> EmployeeDraft {
        if let Some(v) = self.first_name {
            draft.first_name = v;
        }
        if let Some(v) = self.last_name {
            draft.last_name = v;
        }
        if let Some(v) = self.position {
            draft.position = v;
        }
        if let Some(v) = self.email {
            draft.email = v;
        }
        if let Some(v) = self.birth_date {
            draft.birth_date = v;
        }
        draft
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    Register(CredentialArgs),
    Login(CredentialArgs),
    Logout,
    /// List the valid positions.
    Positions,
    List {
        /// Case-insensitive first-name filter.
        #[arg(long, default_value = "")]
        search: String,
        /// Zero-based page index.
        #[arg(long, default_value_t = 0)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    Create(EmployeeFields),
    /// Replace an employee; omitted fields keep their current values.
    Update {
        #[arg(long)]
        id: i64,
        #[command(flatten)]
        fields: EmployeeFields,
    },
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        settings.api_base_url = url;
    }

    let session_file = SessionFile::new(settings.session_file.clone());
    let credentials = Arc::new(SessionCredentials::new());
    if let Some(token) = session_file.load()? {
        credentials.set(token).await;
    }
    let client = Arc::new(
        EmployeeApiClient::with_timeout(
            &settings.api_base_url,
            credentials.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )
        .with_context(|| format!("invalid api url '{}'", settings.api_base_url))?,
    );

    match cli.command {
        Command::Register(args) => {
            let password = SecretString::from(args.password);
            sign_up(&*client, &args.email, &password)
                .await
                .map_err(report)?;
            println!("Registered {}. You can now log in.", args.email);
        }
        Command::Login(args) => {
            let password = SecretString::from(args.password);
            let token = sign_in(&*client, &credentials, &args.email, &password)
                .await
                .map_err(report)?;
            session_file.save(&token)?;
            println!(
                "Logged in as {} (session stored in {}).",
                args.email,
                session_file.path().display()
            );
        }
        Command::Logout => {
            credentials.clear().await;
            if session_file.clear()? {
                println!("Logged out.");
            } else {
                println!("No active session.");
            }
        }
        Command::Positions => {
            require_session(&credentials).await?;
            let store = DirectoryStore::new(client.clone());
            store
                .load_positions(&*client)
                .await
                .map_err(|err| report(err.into()))?;
            for position in store.positions().await {
                println!("{position}");
            }
        }
        Command::List {
            search,
            page,
            page_size,
        } => {
            require_session(&credentials).await?;
            let store = DirectoryStore::new(client.clone());
            store.load().await.map_err(|err| report(err.into()))?;
            store.set_search_term(search).await;
            let page_size = page_size.unwrap_or(settings.page_size);
            print_page(&store, page, page_size).await;
        }
        Command::Create(fields) => {
            require_session(&credentials).await?;
            let store = DirectoryStore::new(client.clone());
            load_catalog(&store, &client).await;
            let created = store
                .create(fields.apply_to(EmployeeDraft::default()))
                .await
                .map_err(report)?;
            println!("Created employee {}.", created.id);
        }
        Command::Update { id, fields } => {
            require_session(&credentials).await?;
            let id = EmployeeId(id);
            let store = DirectoryStore::new(client.clone());
            store.load().await.map_err(|err| report(err.into()))?;
            load_catalog(&store, &client).await;
            let Some(current) = store.records().await.into_iter().find(|r| r.id == id) else {
                bail!("employee {id} not found");
            };
            let updated = store
                .update(id, fields.apply_to(current.to_draft()))
                .await
                .map_err(report)?;
            println!("Updated employee {}.", updated.id);
        }
        Command::Delete { id } => {
            require_session(&credentials).await?;
            let store = DirectoryStore::new(client.clone());
            store.delete(EmployeeId(id)).await.map_err(report)?;
            println!("Deleted employee {id}.");
        }
    }

    Ok(())
}

async fn require_session(credentials: &SessionCredentials) -> Result<()> {
    if !credentials.is_authenticated().await {
        bail!("not logged in; run `employee-console login` first");
    }
    Ok(())
}

/// Position validation is skipped when the catalog cannot be fetched.
async fn load_catalog(store: &DirectoryStore, client: &EmployeeApiClient) {
    if let Err(err) = store.load_positions(client).await {
        warn!(error = %err, "continuing without position catalog");
    }
}

fn report(err: ClientError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

async fn print_page(store: &DirectoryStore, page: usize, page_size: usize) {
    let rows = store.page(page, page_size).await;
    let matching = store.filtered_len().await;
    let pages = store.page_count(page_size).await;
    println!(
        "page {} of {} ({} matching, {} total)",
        page.saturating_add(1),
        pages.max(1),
        matching,
        store.records().await.len()
    );
    println!(
        "{:>6}  {:<16} {:<16} {:<16} {:<28} {}",
        "ID", "FIRST NAME", "LAST NAME", "POSITION", "EMAIL", "BIRTH DATE"
    );
    for record in &rows {
        println!("{}", format_row(record));
    }
}

fn format_row(record: &EmployeeRecord) -> String {
    format!(
        "{:>6}  {:<16} {:<16} {:<16} {:<28} {}",
        record.id,
        record.first_name,
        record.last_name,
        record.position,
        record.email,
        record.birth_date
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

mod config;
mod serve_cmd;
mod share_cmds;
#[cfg(test)]
mod test_util;
mod trip_cmds;

use clap::{Parser, Subcommand};

use gaggle_db::models::CollaboratorRole;
use gaggle_db::pool;

use config::GaggleConfig;

#[derive(Parser)]
#[command(name = "gaggle", about = "Plan trips for several families at once")]
struct Cli {
    /// Database URL (overrides GAGGLE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Act as this user (overrides GAGGLE_USER env var)
    #[arg(long = "as", global = true, value_name = "EMAIL")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a gaggle config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/gaggle")]
        db_url: String,
        /// OpenAI-compatible gateway base URL
        #[arg(long)]
        llm_base_url: Option<String>,
        /// Model name to request from the gateway
        #[arg(long)]
        llm_model: Option<String>,
        /// Your email address
        #[arg(long)]
        user: Option<String>,
        /// Base URL used in invite links
        #[arg(long)]
        public_url: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the gaggle database (requires config file or env vars)
    DbInit,
    /// Trip management
    Trip {
        #[command(subcommand)]
        command: TripCommands,
    },
    /// Check or uncheck an itinerary item
    Toggle {
        trip_id: String,
        /// Item index, as shown by `trip show`
        index: usize,
    },
    /// Ask the planner about a trip, or ask it to change the itinerary
    Chat { trip_id: String, message: String },
    /// Suggest destinations matching a partial name
    Suggest { query: String },
    /// Turn on (or off) the public share link for a trip
    Share {
        trip_id: String,
        /// Hide the trip from its share link
        #[arg(long)]
        private: bool,
    },
    /// Invite links
    Invite {
        #[command(subcommand)]
        command: InviteCommands,
    },
    /// Trip collaborators
    Collaborator {
        #[command(subcommand)]
        command: CollaboratorCommands,
    },
    /// Flock (friend) connections
    Flock {
        #[command(subcommand)]
        command: FlockCommands,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Subcommand)]
pub enum TripCommands {
    /// Generate and save a trip from a setup TOML file
    Create {
        /// Path to the trip setup TOML
        file: String,
    },
    /// List trips you own or collaborate on
    List,
    /// Show a trip's day tabs and progress
    Show { trip_id: String },
    /// Delete a trip you own
    Delete { trip_id: String },
}

#[derive(Subcommand)]
pub enum InviteCommands {
    /// Create an invite link (valid for 7 days)
    Create {
        trip_id: String,
        /// viewer or editor
        #[arg(long, default_value = "viewer")]
        role: CollaboratorRole,
    },
    /// Join a trip with an invite code
    Claim { code: String },
}

#[derive(Subcommand)]
pub enum CollaboratorCommands {
    /// Invite someone by email
    Add {
        trip_id: String,
        email: String,
        /// viewer or editor
        #[arg(long, default_value = "viewer")]
        role: CollaboratorRole,
    },
    /// List a trip's collaborators
    List { trip_id: String },
}

#[derive(Subcommand)]
pub enum FlockCommands {
    /// Ask someone to join your flock
    Request { email: String },
    /// Answer a flock request
    Respond {
        id: String,
        /// Decline instead of accepting
        #[arg(long)]
        decline: bool,
    },
    /// List your flock connections
    List,
}

struct InitOptions {
    db_url: String,
    llm_base_url: Option<String>,
    llm_model: Option<String>,
    user: Option<String>,
    public_url: Option<String>,
    force: bool,
}

/// Execute the `gaggle init` command: write config file.
fn cmd_init(opts: InitOptions) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !opts.force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut llm = config::LlmSection::default();
    if let Some(url) = opts.llm_base_url {
        llm.base_url = url;
    }
    if let Some(model) = opts.llm_model {
        llm.model = model;
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: opts.db_url.clone(),
        },
        llm,
        user: opts.user.map(|email| config::UserSection { email }),
        server: opts
            .public_url
            .map(|public_url| config::ServerSection { public_url }),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {}", opts.db_url);
    println!("  llm.base_url = {}", cfg.llm.base_url);
    println!("  llm.model    = {}", cfg.llm.model);
    if let Some(user) = &cfg.user {
        println!("  user.email   = {}", user.email);
    }
    println!();
    println!("Set GAGGLE_LLM_API_KEY (or add llm.api_key to the file), then run `gaggle db-init`.");

    Ok(())
}

/// Execute the `gaggle db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &GaggleConfig) -> anyhow::Result<()> {
    println!("Initializing gaggle database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("gaggle db-init complete.");
    Ok(())
}

async fn cmd_serve(resolved: &GaggleConfig, bind: &str, port: u16) -> anyhow::Result<()> {
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    let planner = match trip_cmds::build_planner(&resolved.gateway) {
        Ok(planner) => Some(planner),
        Err(err) => {
            tracing::warn!(error = %err, "planner unavailable");
            None
        }
    };
    let state = serve_cmd::AppState::new(db_pool.clone(), planner);
    let result = serve_cmd::run_serve(state, bind, port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            llm_base_url,
            llm_model,
            user,
            public_url,
            force,
        } => cmd_init(InitOptions {
            db_url,
            llm_base_url,
            llm_model,
            user,
            public_url,
            force,
        }),
        command => {
            let resolved =
                GaggleConfig::resolve(cli.database_url.as_deref(), cli.user.as_deref())?;
            run_command(command, &resolved).await
        }
    }
}

async fn run_command(command: Commands, resolved: &GaggleConfig) -> anyhow::Result<()> {
    match command {
        Commands::DbInit => cmd_db_init(resolved).await,
        Commands::Suggest { query } => trip_cmds::run_suggest(resolved, &query).await,
        Commands::Serve { bind, port } => cmd_serve(resolved, &bind, port).await,
        command => {
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = run_db_command(command, &db_pool, resolved).await;
            db_pool.close().await;
            result
        }
    }
}

/// Commands that need a database pool and nothing else set up.
async fn run_db_command(
    command: Commands,
    db_pool: &sqlx::PgPool,
    resolved: &GaggleConfig,
) -> anyhow::Result<()> {
    match command {
        Commands::Trip { command } => {
            trip_cmds::run_trip_command(command, db_pool, resolved).await
        }
        Commands::Toggle { trip_id, index } => {
            trip_cmds::run_toggle(db_pool, resolved, &trip_id, index).await
        }
        Commands::Chat { trip_id, message } => {
            trip_cmds::run_chat(db_pool, resolved, &trip_id, &message).await
        }
        Commands::Share { trip_id, private } => {
            share_cmds::run_share(db_pool, resolved, &trip_id, private).await
        }
        Commands::Invite { command } => {
            share_cmds::run_invite_command(command, db_pool, resolved).await
        }
        Commands::Collaborator { command } => {
            share_cmds::run_collaborator_command(command, db_pool, resolved).await
        }
        Commands::Flock { command } => {
            share_cmds::run_flock_command(command, db_pool, resolved).await
        }
        Commands::Init { .. }
        | Commands::DbInit
        | Commands::Suggest { .. }
        | Commands::Serve { .. } => {
            anyhow::bail!("command does not use the database pool directly")
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_user_and_role() {
        let cli = Cli::try_parse_from([
            "gaggle",
            "--as",
            "kim@example.com",
            "invite",
            "create",
            "3f2c1a9e-0000-4000-8000-000000000000",
            "--role",
            "editor",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("kim@example.com"));
        match cli.command {
            Commands::Invite {
                command: InviteCommands::Create { role, .. },
            } => assert_eq!(role, CollaboratorRole::Editor),
            _ => panic!("expected invite create"),
        }
    }

    #[test]
    fn rejects_unknown_role() {
        let result = Cli::try_parse_from([
            "gaggle",
            "collaborator",
            "add",
            "3f2c1a9e-0000-4000-8000-000000000000",
            "a@b.com",
            "--role",
            "admin",
        ]);
        assert!(result.is_err());
    }
}

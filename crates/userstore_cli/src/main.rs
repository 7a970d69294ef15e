//! Command-line front end for the user store.
//!
//! Opens the SQLite datastore named by `USERSTORE_DB_PATH` and runs one
//! service operation per invocation. Users print as one JSON object per line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use userstore_core::{
    core_version, init_logging, ping, RequestContext, SqliteDatastore, StoreConfig, User,
    UserService,
};

#[derive(Parser)]
#[command(name = "userstore")]
#[command(about = "Create, read, update and delete stored users", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the core library is linked
    Ping,
    /// Print the core crate version
    Version,
    #[command(flatten)]
    User(UserCommand),
}

#[derive(Subcommand)]
enum UserCommand {
    /// Store a new user (overwrites an existing email)
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Show one user by email
    Get { email: String },
    /// List every stored user
    List,
    /// Overwrite the user stored under an email
    Update {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Remove a user by email
    Delete { email: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ping => println!("userstore_core ping={}", ping()),
        Commands::Version => println!("userstore_core version={}", core_version()),
        Commands::User(command) => run(command)?,
    }

    Ok(())
}

fn run(command: UserCommand) -> Result<()> {
    let config = StoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    let store = SqliteDatastore::open(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let ctx = RequestContext::with_scope(&store, config.request_scope());
    let service = UserService::new();
    info!("event=cli_run module=cli status=start");

    match command {
        UserCommand::Create { name, email } => {
            print_user(&service.create(&ctx, Some(&User::new(name, email)))?)?
        }
        UserCommand::Get { email } => print_user(&service.get_by_email(&ctx, &email)?)?,
        UserCommand::List => {
            for user in service.get_users(&ctx)? {
                print_user(&user)?;
            }
        }
        UserCommand::Update { name, email } => {
            print_user(&service.update(&ctx, Some(&User::new(name, email)))?)?
        }
        UserCommand::Delete { email } => service.delete(&ctx, &email)?,
    }

    Ok(())
}

fn print_user(user: &User) -> Result<()> {
    println!("{}", serde_json::to_string(user)?);
    Ok(())
}

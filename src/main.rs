use clap::{Parser, Subcommand};
use database::{Database, DbRepository};
use events::{AuthEvent, NotificationKind};
use identity::{AuthContext, CognitoClient, FileSessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use web_server::AppState;

/// The main entry point for the BoviTrack livestock application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = configuration::load_settings()?;
    let _log_guard = configuration::init_tracing(&settings.logging)?;

    match cli.command {
        Commands::Serve(args) => {
            if let Some(port) = args.port {
                settings.server.port = port;
            }
            serve(settings).await
        }
        Commands::Migrate => {
            let db = Database::connect(&settings.database).await?;
            db.run_migrations().await?;
            db.close().await;
            Ok(())
        }
        Commands::Login(args) => {
            let auth = auth_context(&settings, args.session_file)?;
            let mut events = auth.subscribe();
            let result = auth.login(&args.email, &args.password).await;
            print_notifications(&mut events);
            let user = result?;
            println!("{} <{}> ({})", user.name, user.email, user.role);
            Ok(())
        }
        Commands::Whoami(args) => {
            let auth = auth_context(&settings, args.session_file)?;
            match auth.restore().await {
                Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        Commands::Logout(args) => {
            let auth = auth_context(&settings, args.session_file)?;
            auth.restore().await;
            let mut events = auth.subscribe();
            auth.logout().await;
            print_notifications(&mut events);
            Ok(())
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Livestock management: farms, animals, weights and veterinary visits.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API (applies pending migrations first).
    Serve(ServeArgs),
    /// Apply pending database migrations and exit.
    Migrate,
    /// Sign in at the identity provider and store the session locally.
    Login(LoginArgs),
    /// Show the user of the stored session, refreshing it.
    Whoami(SessionArgs),
    /// Sign out and forget the stored session.
    Logout(SessionArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides SERVER_PORT.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct SessionArgs {
    /// Where the session is kept between runs.
    #[arg(long, default_value = ".bovitrack/session.json")]
    session_file: PathBuf,
}

#[derive(Parser)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "BOVITRACK_PASSWORD")]
    password: String,
    #[arg(long, default_value = ".bovitrack/session.json")]
    session_file: PathBuf,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn serve(settings: configuration::settings::Settings) -> anyhow::Result<()> {
    let db = Database::connect(&settings.database).await?;
    db.run_migrations().await?;

    if !settings.identity.is_configured() {
        tracing::warn!("COGNITO_USER_POOL_ID / COGNITO_CLIENT_ID not set; sign-in endpoints will fail");
    }
    let state = AppState {
        repo: DbRepository::new(db.clone()),
        identity: Arc::new(CognitoClient::new(&settings.identity)?),
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
    };
    let result = web_server::run_server(&settings.server, state, shutdown).await;

    db.close().await;
    result
}

fn auth_context(
    settings: &configuration::settings::Settings,
    session_file: PathBuf,
) -> anyhow::Result<AuthContext<CognitoClient>> {
    let provider = Arc::new(CognitoClient::new(&settings.identity)?);
    let store = Arc::new(FileSessionStore::new(session_file));
    Ok(AuthContext::new(provider, store))
}

/// Echoes the notifications the auth context has raised so far.
fn print_notifications(events: &mut broadcast::Receiver<AuthEvent>) {
    while let Ok(event) = events.try_recv() {
        if let Some(note) = event.notification() {
            match note.kind {
                NotificationKind::Error => eprintln!("{}", note.message),
                NotificationKind::Success | NotificationKind::Info => println!("{}", note.message),
            }
        }
    }
}

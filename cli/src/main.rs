mod account;
mod recipes;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hasha_core::{
    AuthBridge, AuthError, CognitoProvider, HashaConfig, RecipeClient, ReqwestTransport,
    SessionFile,
};

#[derive(Parser)]
#[command(name = "hasha")]
#[command(about = "Hasha recipe client", long_about = None)]
struct Cli {
    /// Recipe API root (overrides HASHA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session file (overrides HASHA_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and send a verification code
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Verification code, if already received; confirms and signs in immediately
        #[arg(long)]
        code: Option<String>,
    },
    /// Confirm an account with the emailed code
    Confirm {
        #[arg(long)]
        username: String,
        #[arg(long)]
        code: String,
        /// Sign in right after confirming
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in with email (or username) and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List your recipes
    List,
    /// Show one recipe in full
    Show {
        #[arg(long)]
        id: i64,
    },
    /// Create a recipe
    Create(recipes::CreateArgs),
    /// Delete a recipe by id
    Delete {
        #[arg(long)]
        id: i64,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Everything a command needs, built once from config and flags.
pub struct App {
    pub config: HashaConfig,
    pub auth: AuthBridge,
}

impl App {
    fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = HashaConfig::from_env()
            .context("Failed to load configuration")?;
        if let Some(api_url) = &cli.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(session_file) = &cli.session_file {
            config.session_file = session_file.clone();
        }

        let client_id = config.cognito_client_id.clone().ok_or_else(|| {
            AuthError::NotConfigured("HASHA_COGNITO_CLIENT_ID is not set".to_string())
        })?;
        let mut provider = CognitoProvider::new(
            &config.cognito_region,
            client_id,
            SessionFile::new(config.session_file.clone()),
        )
        .with_timeout(config.http_timeout)?;
        if let Some(endpoint) = &config.cognito_endpoint {
            provider = provider.with_endpoint(endpoint.clone());
        }

        Ok(Self {
            auth: AuthBridge::new(Arc::new(provider)),
            config,
        })
    }

    /// Resolve the stored session and build a recipe client bound to it.
    pub async fn recipe_client(&self) -> Result<RecipeClient> {
        let session = self.auth.resolve().await;
        if !session.is_signed_in() {
            tracing::debug!("no signed-in session");
        }
        let transport = ReqwestTransport::builder(self.config.api_url.clone())
            .timeout(self.config.http_timeout)
            .build()
            .context("Failed to build HTTP transport")?;
        Ok(RecipeClient::new(Arc::new(transport), &session))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let app = App::from_cli(&cli)?;

    match cli.command {
        Commands::Signup {
            username,
            email,
            password,
            code,
        } => {
            account::signup(&app, username, email, password, code).await?;
        }
        Commands::Confirm {
            username,
            code,
            password,
        } => {
            account::confirm(&app, username, code, password).await?;
        }
        Commands::Login { email, password } => {
            account::login(&app, email, password).await?;
        }
        Commands::Logout => {
            account::logout(&app).await;
        }
        Commands::Whoami => {
            account::whoami(&app).await;
        }
        Commands::List => {
            recipes::list(&app).await?;
        }
        Commands::Show { id } => {
            recipes::show(&app, id).await?;
        }
        Commands::Create(args) => {
            recipes::create(&app, args).await?;
        }
        Commands::Delete { id } => {
            recipes::delete(&app, id).await?;
        }
    }

    Ok(())
}

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared::{translate, InvoiceFilter, Language, NewInvoice, ProfileUpdate};

mod api;
mod config;
mod provider;
mod session;
mod store;
mod tui;

use api::ApiClient;
use config::Config;
use provider::AuthClient;
use session::SessionGate;

// Default backend API base URL
const DEFAULT_API_URL: &str = "https://freelpay.com/api";

#[derive(Parser)]
#[command(name = "freelpay")]
#[command(about = "Invoice financing for freelancers - terminal client")]
#[command(version)]
struct Cli {
    /// Backend API base URL (overrides config)
    #[arg(long)]
    api_url: Option<String>,

    /// Identity provider base URL (overrides config)
    #[arg(long)]
    auth_url: Option<String>,

    /// UI language: en or fr (overrides config)
    #[arg(long)]
    language: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Log out and revoke the session
    Logout,
    /// Show current login status
    Whoami,
    /// Create an account with the identity provider
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Request a password-reset email
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List invoices as a plain table
    List {
        /// Filter by status (Draft, Sent, Signed, Financed)
        #[arg(long)]
        status: Option<String>,
        /// Case-insensitive search on client or invoice number
        #[arg(long)]
        search: Option<String>,
    },
    /// Create an invoice from form fields
    Create {
        #[arg(long)]
        invoice_number: String,
        #[arg(long)]
        client: String,
        #[arg(long)]
        amount: f64,
        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due_date: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Upload an invoice PDF; the server extracts the fields
    Upload {
        file: std::path::PathBuf,
    },
    /// Send an invoice to the client
    Send {
        invoice_id: String,
    },
    /// Show or update the user profile
    Profile {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        siret: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Look up a company by its 9-digit SIREN
    Company {
        siren: String,
    },
    /// Ask the assistant a question about your invoices
    Ask {
        query: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, auth_url, auth_key, language)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        key: String,
    },
    /// Show all configuration
    Show,
    /// Get the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freelpay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load().unwrap_or_default();
    if let Some(url) = &cli.api_url {
        config.remote.api_url = Some(url.clone());
    }
    if let Some(url) = &cli.auth_url {
        config.remote.auth_url = Some(url.clone());
    }
    let language = cli
        .language
        .as_deref()
        .map(Language::parse)
        .unwrap_or(config.ui.language);

    match cli.command {
        Some(Commands::Config { action }) => handle_config_command(action),
        Some(Commands::Login { email, password }) => login(config, language, email, password).await,
        Some(Commands::Logout) => logout(config, language).await,
        Some(Commands::Whoami) => whoami(config).await,
        Some(Commands::Signup { email, password }) => signup(config, email, password).await,
        Some(Commands::ResetPassword { email }) => reset_password(config, email).await,
        Some(command) => {
            // Everything else is protected: resolve the session first
            let ctx = AppContext::initialize(config, language).await?;
            match command {
                Commands::List { status, search } => ctx.list(status, search).await,
                Commands::Create {
                    invoice_number,
                    client,
                    amount,
                    due_date,
                    description,
                } => {
                    ctx.create(invoice_number, client, amount, due_date, description)
                        .await
                }
                Commands::Upload { file } => ctx.upload(file).await,
                Commands::Send { invoice_id } => ctx.send(invoice_id).await,
                Commands::Profile {
                    email,
                    siret,
                    phone,
                    address,
                } => ctx.profile(email, siret, phone, address).await,
                Commands::Company { siren } => ctx.company(siren).await,
                Commands::Ask { query } => ctx.ask(query).await,
                _ => unreachable!(),
            }
        }
        None => {
            let ctx = AppContext::initialize(config, language).await?;
            ctx.dashboard().await
        }
    }
}

/// Resolved context for protected commands: config, session gate and API
/// client, with the gate initialized before anything protected runs.
struct AppContext {
    gate: Arc<SessionGate>,
    api: Arc<ApiClient>,
    language: Language,
}

impl AppContext {
    async fn initialize(mut config: Config, language: Language) -> Result<Self> {
        let gate = Arc::new(SessionGate::new());

        // Resolve the stored refresh token against the provider; the gate
        // leaves Loading exactly once, before any protected view renders.
        let refreshed = match (auth_client(&config).ok(), &config.remote.refresh_token) {
            (Some(auth), Some(refresh_token)) => match auth.refresh(refresh_token).await {
                Ok(session) => session,
                Err(e) => {
                    // Unreachable provider is not the same as being logged
                    // out; the stored tokens stay put for the retry.
                    tracing::warn!("could not reach identity provider: {}", e);
                    bail!(
                        "{} ({})",
                        translate(language, "auth.provider_unreachable"),
                        e
                    );
                }
            },
            _ => None,
        };
        match refreshed {
            Some(session) => {
                config.remember_session(
                    session.access_token().to_string(),
                    session.refresh_token.clone(),
                );
                config.save()?;
                gate.initialize(Some(session));
            }
            None => gate.initialize(None),
        }

        if let Err(e) = gate.require_auth() {
            bail!("{}", translate(language, e.translation_key()));
        }

        let api_url = config
            .remote
            .api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api = Arc::new(ApiClient::new(api_url, gate.clone()));

        Ok(Self {
            gate,
            api,
            language,
        })
    }

    async fn dashboard(&self) -> Result<()> {
        let session_lost = tui::run(self.api.clone(), self.gate.clone(), self.language).await?;
        if session_lost {
            let key = session::NotAuthenticated.translation_key();
            eprintln!("{}", translate(self.language, key));
        }
        Ok(())
    }

    async fn list(&self, status: Option<String>, search: Option<String>) -> Result<()> {
        let status = status.as_deref().map(parse_status_arg).transpose()?;
        let invoices = self.api.list_invoices().await?;
        let filter = InvoiceFilter {
            search,
            status,
            ..Default::default()
        };
        let visible = filter.apply(&invoices);

        println!(
            "{:<12} {:<14} {:<24} {:>14} {:<10} {:>14}",
            "Created", "Number", "Client", "Amount", "Status", "Possible"
        );
        for invoice in visible {
            println!(
                "{:<12} {:<14} {:<24} {:>14} {:<10} {:>14}",
                invoice.created_date.format("%Y-%m-%d"),
                invoice.invoice_number,
                invoice.client,
                invoice.amount_display(),
                invoice.status.label(),
                invoice.possible_financing_display(),
            );
        }
        Ok(())
    }

    async fn create(
        &self,
        invoice_number: String,
        client: String,
        amount: f64,
        due_date: String,
        description: Option<String>,
    ) -> Result<()> {
        let due_date = chrono::NaiveDate::parse_from_str(&due_date, "%Y-%m-%d")
            .context("due date must be YYYY-MM-DD")?
            .and_hms_opt(0, 0, 0)
            .context("due date out of range")?
            .and_utc();
        let new = NewInvoice {
            invoice_number,
            client,
            amount,
            due_date,
            description,
        };
        let invoice = self.api.create_invoice(&new).await?;
        println!(
            "{}: {} ({})",
            translate(self.language, "invoice.created"),
            invoice.invoice_number,
            invoice.status.label()
        );
        if let Some(possible) = invoice.possible_financing {
            println!("Possible financing: {:.2} {}", possible, invoice.currency);
        }
        Ok(())
    }

    async fn upload(&self, file: std::path::PathBuf) -> Result<()> {
        let invoice = self.api.upload_invoice(&file).await?;
        println!(
            "{}: {} ({})",
            translate(self.language, "invoice.created"),
            invoice.invoice_number,
            invoice.status.label()
        );
        Ok(())
    }

    async fn send(&self, invoice_id: String) -> Result<()> {
        match self.api.send_invoice(&invoice_id).await {
            Ok(()) => {
                println!("{}", translate(self.language, "dashboard.send_success"));
                Ok(())
            }
            Err(e) => {
                bail!("{}: {}", translate(self.language, "dashboard.send_error"), e)
            }
        }
    }

    async fn profile(
        &self,
        email: Option<String>,
        siret: Option<String>,
        phone: Option<String>,
        address: Option<String>,
    ) -> Result<()> {
        let update = ProfileUpdate {
            email,
            siret_number: siret,
            phone,
            address,
        };
        let profile = if update.is_empty() {
            self.api.get_profile().await?
        } else {
            self.api.update_profile(&update).await?
        };
        println!("username: {}", profile.username);
        println!("email:    {}", profile.email);
        println!("siret:    {}", profile.siret_number.as_deref().unwrap_or("-"));
        println!("phone:    {}", profile.phone.as_deref().unwrap_or("-"));
        println!("address:  {}", profile.address.as_deref().unwrap_or("-"));
        Ok(())
    }

    async fn company(&self, siren: String) -> Result<()> {
        match self.api.validate_siren(&siren).await {
            Ok(info) => {
                println!("{} ({})", info.name, info.siren);
                println!("address:  {}", info.address);
                println!("activity: {}", info.activity.as_deref().unwrap_or("-"));
                println!("created:  {}", info.creation_date.as_deref().unwrap_or("-"));
                println!("staff:    {}", info.staff_size);
                println!("status:   {}", info.status);
                Ok(())
            }
            Err(api::ApiError::Registry(e)) => {
                bail!("{}", translate(self.language, e.translation_key()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ask(&self, query: String) -> Result<()> {
        let answer = self.api.ask(&query).await?;
        println!("{}", answer);
        Ok(())
    }
}

/// Parse a `--status` argument. Unlike backend payloads, a typo here
/// should be an error, not a silently empty table.
fn parse_status_arg(raw: &str) -> Result<shared::InvoiceStatus> {
    match shared::classify(raw) {
        shared::InvoiceStatus::Unknown => bail!(
            "unknown status '{}'; valid values: Draft, Sent, Signed, Financed",
            raw
        ),
        status => Ok(status),
    }
}

fn auth_client(config: &Config) -> Result<AuthClient> {
    let auth_url = config
        .remote
        .auth_url
        .clone()
        .context("identity provider URL not configured; run 'freelpay config set auth_url <url>'")?;
    let auth_key = config
        .remote
        .auth_key
        .clone()
        .context("identity provider key not configured; run 'freelpay config set auth_key <key>'")?;
    Ok(AuthClient::new(auth_url, auth_key))
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn login(
    mut config: Config,
    language: Language,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let auth = auth_client(&config)?;
    let email = match email {
        Some(e) => e,
        None => prompt("Email")?,
    };
    let password = match password {
        Some(p) => p,
        None => prompt("Password")?,
    };

    let session = auth.sign_in(&email, &password).await?;
    config.remember_session(
        session.access_token().to_string(),
        session.refresh_token.clone(),
    );
    config.save()?;

    println!("{}", translate(language, "auth.login_success"));
    if let Some(email) = &session.user.email {
        println!("Logged in as {}", email);
    }
    Ok(())
}

async fn logout(mut config: Config, language: Language) -> Result<()> {
    // Revoke on the provider side when possible; local tokens are cleared
    // regardless
    if let (Ok(auth), Some(token)) = (auth_client(&config), config.remote.access_token.clone()) {
        if let Err(e) = auth.sign_out(&token).await {
            tracing::warn!("provider sign-out failed: {}", e);
        }
    }
    config.forget_session();
    config.save()?;
    println!("{}", translate(language, "auth.logged_out"));
    Ok(())
}

async fn whoami(config: Config) -> Result<()> {
    match &config.remote.refresh_token {
        Some(refresh_token) => {
            let auth = auth_client(&config)?;
            match auth.refresh(refresh_token).await? {
                Some(session) => {
                    println!("Logged in");
                    println!("user id: {}", session.user.id);
                    if let Some(email) = &session.user.email {
                        println!("email:   {}", email);
                    }
                }
                None => {
                    println!("Session expired. Run 'freelpay login' to authenticate.");
                }
            }
        }
        None => {
            println!("Not logged in. Run 'freelpay login' to authenticate.");
        }
    }
    Ok(())
}

async fn signup(config: Config, email: String, password: String) -> Result<()> {
    let auth = auth_client(&config)?;
    let session = auth.sign_up(&email, &password).await?;
    println!("Account created for {}", email);
    let _ = session; // usable after email confirmation, depending on provider settings
    println!("Check your inbox to confirm the address, then run 'freelpay login'.");
    Ok(())
}

async fn reset_password(config: Config, email: String) -> Result<()> {
    let auth = auth_client(&config)?;
    auth.request_password_reset(&email).await?;
    println!("Password reset email sent to {}", email);
    Ok(())
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            let mut config = Config::load().unwrap_or_default();
            match key.as_str() {
                "api_url" => config.remote.api_url = Some(value),
                "auth_url" => config.remote.auth_url = Some(value),
                "auth_key" => config.remote.auth_key = Some(value),
                "language" => config.ui.language = Language::parse(&value),
                _ => bail!(
                    "Unknown config key: {}. Valid keys: api_url, auth_url, auth_key, language",
                    key
                ),
            }
            config.save()?;
            println!("Configuration saved");
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = match key.as_str() {
                "api_url" => config.remote.api_url.unwrap_or_default(),
                "auth_url" => config.remote.auth_url.unwrap_or_default(),
                "auth_key" => config.remote.auth_key.map(|_| "****".to_string()).unwrap_or_default(),
                "language" => config.ui.language.tag().to_string(),
                _ => bail!("Unknown config key: {}", key),
            };
            println!("{}", value);
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("api_url: {}", config.remote.api_url.unwrap_or_default());
            println!("auth_url: {}", config.remote.auth_url.unwrap_or_default());
            println!(
                "auth_key: {}",
                config.remote.auth_key.map(|_| "****").unwrap_or_default()
            );
            println!(
                "token: {}",
                config.remote.access_token.map(|_| "****").unwrap_or_default()
            );
            println!("language: {}", config.ui.language.tag());
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_argument_accepts_canonical_values() {
        assert_eq!(
            parse_status_arg("Sent").unwrap(),
            shared::InvoiceStatus::Sent
        );
        assert_eq!(
            parse_status_arg("draft").unwrap(),
            shared::InvoiceStatus::Draft
        );
    }

    #[test]
    fn test_status_argument_rejects_garbage_with_hint() {
        let err = parse_status_arg("garbage").unwrap_err();
        assert!(err.to_string().contains("valid values"));
    }
}

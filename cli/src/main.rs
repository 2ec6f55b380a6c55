use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use auth::guard::{self, GuardDecision};
use auth::persistence::PersistenceError;
use auth::{AuthConfig, AuthError, CancellationToken, FileCredentialStore, RegisterRequest, Role, SessionContext};
use clap::{Args, Parser, Subcommand};
use console::{ConsoleApi, ConsoleError, LoadOutcome, ProfileUpdate, Resource};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error("credential store failed: {0}")]
    Credentials(#[from] PersistenceError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("password confirmation does not match")]
    PasswordMismatch,
    #[error("not logged in; run `campus-cli login` first")]
    NotLoggedIn,
    #[error("unknown route `{0}`")]
    UnknownRoute(String),
    #[error("canceled")]
    Canceled,
}

impl CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Auth(inner) => inner.error_code(),
            Self::Console(inner) => inner.error_code(),
            Self::Credentials(_) => "E_CREDENTIALS",
            Self::InvalidJson(_) => "E_INVALID_JSON",
            Self::PasswordMismatch => "E_PASSWORD_MISMATCH",
            Self::NotLoggedIn => "E_NOT_LOGGED_IN",
            Self::UnknownRoute(_) => "E_UNKNOWN_ROUTE",
            Self::Canceled => "E_CANCELED",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "campus-cli", about = "Campus console session and administration CLI")]
struct Cli {
    /// API root; overrides the value from the environment config.
    #[arg(long, env = "CAMPUS_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "CAMPUS_CREDENTIALS_FILE", default_value = ".campus/credentials.json")]
    credentials_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register an institution and its manager account.
    Register(RegisterArgs),
    Login {
        email: String,
        #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Print the logged-in identity.
    Whoami,
    ForgotPassword {
        email: String,
    },
    /// Show what the route guard decides for a path.
    Route {
        path: String,
    },
    Admin(AdminCommand),
    User(UserCommand),
    Profile(ProfileCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    /// Institution name.
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    contact: String,
    #[arg(long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    confirm_password: String,
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    List,
    Create { email: String },
    Delete { admin_id: i64 },
}

#[derive(Args, Debug)]
struct UserCommand {
    #[command(subcommand)]
    command: UserSubcommand,
}

#[derive(Subcommand, Debug)]
enum UserSubcommand {
    List,
    Create {
        email: String,
        /// `teacher` or `student`.
        #[arg(long)]
        role: Role,
    },
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone_number: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn report(error: &CliError) {
    eprintln!("error[{}]: {error}", error.error_code());
    let fields = match error {
        CliError::Auth(inner) | CliError::Console(ConsoleError::Auth(inner)) => inner.field_errors(),
        _ => None,
    };
    for (field, message) in fields.into_iter().flat_map(|fields| fields.iter()) {
        eprintln!("  {field}: {message}");
    }
}

fn load_config(base_url: Option<&str>) -> Result<AuthConfig, CliError> {
    let mut config = AuthConfig::from_env()?;
    if let Some(url) = base_url {
        config.base_url = AuthConfig::with_base_url(url)?.base_url;
    }
    Ok(config)
}

/// Token canceled on Ctrl-C so in-flight requests stop without writing state.
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted");
            trigger.cancel();
        }
    });
    cancel
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.base_url.as_deref())?;
    let credentials = Arc::new(FileCredentialStore::open(&cli.credentials_file)?);
    let session = SessionContext::from_config(&config, credentials)?;
    let cancel = interrupt_token();

    tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(CliError::Canceled),
        () = session.initialize() => {}
    }

    match cli.command {
        Command::Register(args) => run_register(&session, args).await,
        Command::Login { email, password } => run_login(&session, &email, &password, &cancel).await,
        Command::Logout => {
            session.logout();
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let user = session.store().user().ok_or(CliError::NotLoggedIn)?;
            print_json(&user)
        }
        Command::ForgotPassword { email } => {
            let ack = session.forgot_password(&email).await?;
            print_json(&ack)
        }
        Command::Route { path } => {
            let decision = guard::route_decision(&session.store().snapshot(), &path)
                .ok_or_else(|| CliError::UnknownRoute(path.clone()))?;
            println!("{}", describe_decision(decision));
            Ok(())
        }
        Command::Admin(admin) => {
            let api = ConsoleApi::from_context(&session, &config)?;
            run_admin(&api, admin, &cancel).await
        }
        Command::User(user) => {
            let api = ConsoleApi::from_context(&session, &config)?;
            run_user(&api, user, &cancel).await
        }
        Command::Profile(profile) => {
            let api = ConsoleApi::from_context(&session, &config)?;
            run_profile(&api, profile, &cancel).await
        }
    }
}

async fn run_register(session: &SessionContext, args: RegisterArgs) -> Result<(), CliError> {
    if args.password != args.confirm_password {
        return Err(CliError::PasswordMismatch);
    }
    let request = RegisterRequest {
        name: args.name,
        manager_email: args.email,
        manager_contact: args.contact,
        manager_password: args.password,
        manager_confirm_password: args.confirm_password,
    };
    let created = session.register(&request).await?;
    print_json(&created)
}

async fn run_login(
    session: &SessionContext,
    email: &str,
    password: &str,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let user = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(CliError::Canceled),
        result = session.login(email, password) => result?,
    };
    let dashboard = user.role.dashboard_path();
    print_json(&json!({ "user": user, "dashboard": dashboard }))
}

async fn run_admin(api: &ConsoleApi, admin: AdminCommand, cancel: &CancellationToken) -> Result<(), CliError> {
    match admin.command {
        AdminSubcommand::List => {
            let admins = load(api.list_admins(cancel), cancel).await?;
            print_json(&admins)
        }
        AdminSubcommand::Create { email } => {
            let created = api.create_admin(&email, cancel).await?;
            print_json(&created)
        }
        AdminSubcommand::Delete { admin_id } => {
            let ack = api.delete_admin(admin_id, cancel).await?;
            print_json(&ack)
        }
    }
}

async fn run_user(api: &ConsoleApi, user: UserCommand, cancel: &CancellationToken) -> Result<(), CliError> {
    match user.command {
        UserSubcommand::List => {
            let users = load(api.list_users(cancel), cancel).await?;
            print_json(&users)
        }
        UserSubcommand::Create { email, role } => {
            let created = api.create_user(&email, role, cancel).await?;
            print_json(&created)
        }
    }
}

async fn run_profile(api: &ConsoleApi, profile: ProfileCommand, cancel: &CancellationToken) -> Result<(), CliError> {
    match profile.command {
        ProfileSubcommand::Show => {
            let profile = load(api.profile(cancel), cancel).await?;
            print_json(&profile)
        }
        ProfileSubcommand::Update { username, email, phone_number } => {
            let update = ProfileUpdate { username, email, phone_number };
            let profile = api.update_profile(update, cancel).await?;
            print_json(&profile)
        }
    }
}

/// Fetch through a [`Resource`] so reads share the cancellation rules of
/// the console views.
async fn load<T, F>(request: F, cancel: &CancellationToken) -> Result<T, CliError>
where
    T: Clone,
    F: Future<Output = Result<T, ConsoleError>>,
{
    match Resource::new().load(request, cancel).await {
        LoadOutcome::Loaded(data) => Ok(data),
        LoadOutcome::Failed(error) => Err(error.into()),
        LoadOutcome::Canceled => Err(CliError::Canceled),
    }
}

fn describe_decision(decision: GuardDecision) -> String {
    match decision {
        GuardDecision::Render => "render".to_owned(),
        GuardDecision::Redirect(target) => format!("redirect {target}"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

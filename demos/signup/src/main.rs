//! Sign-up / sign-in shell.
//!
//! Runs one auth action against a local identity provider and the
//! configured login backend, then prints every notice and the resulting
//! session state. With `--store` the backend token survives between runs,
//! so `login` followed by another `login` shows the stored-token path.
//!
//! ```text
//! authlink-signup --store /tmp/session.json login -e ada@example.com -p hunter22
//! authlink-signup popup --provider github
//! authlink-signup signup -n "Grace Hopper" -e grace@example.com -p cobol1959
//! ```

use std::path::PathBuf;

use authlink::prelude::*;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "authlink-signup")]
#[command(about = "Drive an Authlink session from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Login backend base URL (overrides AUTHLINK_BACKEND_URL)
    #[arg(long, global = true, value_name = "URL")]
    backend_url: Option<String>,

    /// File to keep the backend token in (overrides AUTHLINK_STORE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account, send the verification email and set the name
    Signup {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign in through the login backend
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign in through an OAuth popup (google, facebook, twitter, github)
    Popup {
        #[arg(long, default_value = "google")]
        provider: String,
    },
    /// Sign out and forget the stored token
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), AuthlinkError> {
    init_logging();
    let cli = Cli::parse();

    let mut config = AuthConfig::from_env();
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
    }
    if let Some(path) = cli.store {
        config.store_path = Some(path);
    }

    tracing::debug!(backend = %config.backend_url, store = ?config.store_path, "session configured");

    let identity = Arc::new(demo_identity());
    let provider = AuthProviderBuilder::new()
        .config(config)
        .build(Arc::clone(&identity))?;
    let mut notices = provider.notices();

    // A hosted SDK reports its initial state right after subscription.
    identity.emit(AuthEvent::Changed(identity.current_user()));

    let actions = provider.actions();
    match cli.command {
        Command::Signup {
            name,
            email,
            password,
        } => {
            actions
                .create_user_with_email_and_password(SignUpCredentials::new(name, email, password))
                .await;
            for (email, _) in identity.verification_mails() {
                println!("verification email sent to {email}");
            }
        }
        Command::Login { email, password } => {
            actions
                .sign_in_with_email_and_password(SignInCredentials::new(email, password))
                .await;
        }
        Command::Popup { provider: name } => {
            actions.sign_in_with_popup(&name).await;
        }
        Command::Logout => {
            actions.logout().await;
        }
    }

    while let Ok(notice) = notices.try_recv() {
        print_notice(&notice);
    }
    print_state(&provider.state());

    provider.unmount();
    Ok(())
}

/// A local identity provider with a linked account for every popup
/// provider.
fn demo_identity() -> InMemoryIdentityProvider {
    OAuthProvider::ALL
        .into_iter()
        .fold(InMemoryIdentityProvider::new(), |identity, provider| {
            let user = UserRecord::new(format!("{}-demo", provider.name()))
                .with_email(format!("demo@{}.example", provider.name()))
                .with_display_name(format!("Demo {provider} user"));
            identity.with_popup_identity(provider, user)
        })
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::FetchStart => println!("… working"),
        Notice::FetchSuccess => println!("✓ done"),
        Notice::FetchError(report) => {
            let place = match report.presentation {
                Presentation::Global => "error",
                Presentation::Inline => "form error",
            };
            println!("✗ {place} ({:?}): {}", report.kind, report.message);
        }
    }
}

fn print_state(state: &SessionState) {
    let user = match &state.user {
        UserSlot::Unresolved => "unresolved".to_string(),
        UserSlot::SignedOut => "signed out".to_string(),
        UserSlot::SignedIn(user) => format!(
            "{} <{}>",
            user.display_name.as_deref().unwrap_or(&user.uid),
            user.email.as_deref().unwrap_or("no email")
        ),
    };
    let method = match state.method {
        Some(AuthMethod::Identity) => "identity provider",
        Some(AuthMethod::BackendToken) => "backend token",
        None => "none",
    };
    println!("user:          {user}");
    println!("authenticated: {}", state.is_authenticated);
    println!("method:        {method}");
    println!("loading:       {}", state.is_loading);
}

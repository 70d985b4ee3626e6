//! iview-server: multi-tenant interview management service
//!
//! `serve` (the default) runs the HTTP API. The other subcommands bootstrap a
//! fresh installation: a tenant, its first users, API keys, and branding.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use iview_common::auth::{load_or_create_session_secret, ScopeSet};
use iview_common::config::{
    load_file_config, resolve_config_path, FileConfig, Overrides, ServiceConfig,
};
use iview_common::db::{init_database, Role};
use sqlx::SqlitePool;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iview_server::audit::{self, Actor};
use iview_server::db::{api_keys, tenants, users};
use iview_server::AppState;

/// Command-line arguments for iview-server
#[derive(Parser, Debug)]
#[command(name = "iview-server")]
#[command(about = "Multi-tenant interview management service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long, global = true, env = "IVIEW_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(long, global = true, env = "IVIEW_DATABASE")]
    database: Option<PathBuf>,

    /// Base URL candidates reach this service at
    #[arg(long, global = true, env = "IVIEW_PUBLIC_URL")]
    public_url: Option<String>,

    #[arg(long, global = true, env = "IVIEW_SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    #[arg(long, global = true, env = "IVIEW_SESSION_TTL_HOURS")]
    session_ttl_hours: Option<u32>,

    /// Conductor service base URL
    #[arg(long, global = true, env = "IVIEW_CONDUCTOR_URL")]
    conductor_url: Option<String>,

    #[arg(long, global = true, env = "IVIEW_RATE_LIMIT_PER_MINUTE")]
    rate_limit_per_minute: Option<u32>,

    #[arg(long, global = true, env = "IVIEW_RATE_LIMIT_BURST")]
    rate_limit_burst: Option<u32>,

    /// Default invitation lifetime
    #[arg(long, global = true, env = "IVIEW_INVITE_TTL_DAYS")]
    invite_ttl_days: Option<u32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Create a tenant
    CreateTenant {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        name: String,
    },
    /// Create a user in a tenant
    CreateUser {
        /// Tenant slug
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "admin")]
        role: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Create an API key and print it once
    CreateApiKey {
        /// Tenant slug
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        name: String,
        /// Space- or comma-separated scopes, e.g. "interviews:read results:read"
        #[arg(long, default_value = "*")]
        scopes: String,
    },
    /// Set tenant branding; omitted options keep their current value
    SetTheme {
        /// Tenant slug
        #[arg(long)]
        tenant: String,
        /// Hex color, e.g. "#1f2937"
        #[arg(long)]
        primary_color: Option<String>,
        #[arg(long)]
        accent_color: Option<String>,
        #[arg(long)]
        logo_url: Option<String>,
        /// Host name that serves this tenant's pages
        #[arg(long)]
        custom_domain: Option<String>,
    },
}

impl Args {
    fn overrides(&self) -> Overrides {
        FileConfig {
            bind: self.bind.clone(),
            database: self.database.clone(),
            public_url: self.public_url.clone(),
            session_secret: self.session_secret.clone(),
            session_ttl_hours: self.session_ttl_hours,
            conductor_url: self.conductor_url.clone(),
            rate_limit_per_minute: self.rate_limit_per_minute,
            rate_limit_burst: self.rate_limit_burst,
            invite_ttl_days: self.invite_ttl_days,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iview_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting iview-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref())?;
    let file_config = match &config_path {
        Some(path) => {
            info!("Config file: {}", path.display());
            load_file_config(path)?
        }
        None => FileConfig::default(),
    };
    let config = ServiceConfig::resolve(args.overrides(), file_config)?;

    info!("Database: {}", config.database_path.display());
    let db = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, config).await,
        Command::CreateTenant { slug, name } => {
            let tenant = tenants::create(&db, &slug, &name).await?;
            let actor = Actor::system(&tenant.id);
            audit::record(&db, &actor, "tenant.create", "tenant", Some(&tenant.id), None).await;
            println!("Created tenant '{}' ({})", tenant.slug, tenant.id);
            Ok(())
        }
        Command::CreateUser {
            tenant,
            email,
            password,
            role,
            display_name,
        } => {
            let tenant = find_tenant(&db, &tenant).await?;
            let role: Role = role.parse().map_err(|e: String| anyhow!(e))?;
            let display_name = display_name.unwrap_or_else(|| email.clone());
            let user =
                users::create(&db, &tenant.id, &email, &display_name, role, &password).await?;
            let actor = Actor::system(&tenant.id);
            audit::record(&db, &actor, "user.create", "user", Some(&user.id), None).await;
            println!("Created {} user {} in '{}'", user.role, user.email, tenant.slug);
            Ok(())
        }
        Command::CreateApiKey { tenant, name, scopes } => {
            let tenant = find_tenant(&db, &tenant).await?;
            let scopes = ScopeSet::parse(&scopes).map_err(|e| anyhow!(e))?;
            if scopes.is_empty() {
                return Err(anyhow!("at least one scope is required"));
            }
            let key = api_keys::create(&db, &tenant.id, &name, &scopes).await?;
            audit::record(
                &db,
                &Actor::system(&tenant.id),
                "api_key.create",
                "api_key",
                Some(&key.record.id),
                None,
            )
            .await;
            println!("API key for '{}' (shown once):", tenant.slug);
            println!("{}", key.key);
            Ok(())
        }
        Command::SetTheme {
            tenant,
            primary_color,
            accent_color,
            logo_url,
            custom_domain,
        } => {
            let tenant = find_tenant(&db, &tenant).await?;
            let update = tenants::ThemeUpdate {
                primary_color,
                accent_color,
                logo_url,
                custom_domain,
            };
            if update.is_empty() {
                return Err(anyhow!("nothing to change; pass at least one theme option"));
            }
            let themed = tenants::update_theme(&db, &tenant.id, &update)
                .await?
                .ok_or_else(|| anyhow!("tenant '{}' disappeared", tenant.slug))?;
            audit::record(
                &db,
                &Actor::system(&themed.id),
                "tenant.theme",
                "tenant",
                Some(&themed.id),
                Some(serde_json::json!({
                    "primary_color": themed.theme_primary_color,
                    "accent_color": themed.theme_accent_color,
                    "logo_url": themed.logo_url,
                    "custom_domain": themed.custom_domain,
                })),
            )
            .await;
            println!("Updated theme for '{}'", themed.slug);
            Ok(())
        }
    }
}

async fn find_tenant(db: &SqlitePool, slug: &str) -> Result<iview_common::db::Tenant> {
    tenants::find_by_slug(db, slug)
        .await?
        .ok_or_else(|| anyhow!("tenant '{}' not found", slug))
}

async fn serve(db: SqlitePool, config: ServiceConfig) -> Result<()> {
    let session_secret = match &config.session_secret {
        Some(secret) => secret.clone(),
        None => load_or_create_session_secret(&db).await?,
    };

    let bind = config.bind;
    let state =
        AppState::new(db, config, session_secret).map_err(|e| anyhow!(e.to_string()))?;
    info!("Public URL: {}", state.config.public_base_url);
    match &state.config.conductor_url {
        Some(url) => info!("Conductor: {}", url),
        None => warn!("No conductor configured; candidates use the local interview page"),
    }

    // Idle rate-limit buckets are dropped periodically
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.retain_recent();
        }
    });

    let app = iview_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use course_platform::server;
use course_platform::{AppState, ContentStore, ContentfulClient, ContentfulConfig, SqliteAccounts};
use secrecy::SecretString;
use tokio::net::TcpListener;
use tracing::warn;
use url::Url;

#[derive(clap::Args)]
pub struct ServeArgs {
    #[clap(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000", value_parser)]
    bind_addr: SocketAddr,

    #[clap(long, env = "DATABASE_PATH", default_value = "course.db", value_parser, value_name = "PATH")]
    database_path: PathBuf,

    #[clap(long, env = "CONTENTFUL_BASE_URL", default_value = "https://cdn.contentful.com", value_parser)]
    contentful_base_url: Url,

    #[clap(long, env = "CONTENTFUL_SPACE_ID", value_parser)]
    contentful_space_id: Option<String>,

    #[clap(long, env = "CONTENTFUL_ENVIRONMENT", value_parser)]
    contentful_environment: Option<String>,

    #[clap(long, env = "CONTENTFUL_ACCESS_TOKEN", hide_env_values = true, value_parser)]
    contentful_access_token: Option<String>,
}

pub async fn serve(args: ServeArgs) -> Result<()> {
    let accounts = SqliteAccounts::open(&args.database_path)
        .with_context(|| format!("opening {}", args.database_path.display()))?;

    let content = match ContentfulConfig::from_parts(
        args.contentful_base_url,
        args.contentful_space_id,
        args.contentful_environment,
        args.contentful_access_token.map(SecretString::new),
    ) {
        Ok(config) => {
            let client = ContentfulClient::new(reqwest::Client::new(), config);
            Some(Arc::new(client) as Arc<dyn ContentStore>)
        }
        Err(err) => {
            warn!("{err}; content requests will fail");
            None
        }
    };

    let listener = TcpListener::bind(args.bind_addr)
        .await
        .with_context(|| format!("binding {}", args.bind_addr))?;

    server::serve(listener, AppState::new(Arc::new(accounts), content)).await?;

    Ok(())
}

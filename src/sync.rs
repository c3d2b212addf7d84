use std::path::PathBuf;

use anyhow::Result;
use course_platform::{
    FileStore, HttpProgressApi, ProgressClient, Session, SyncOutcome, UserDetail,
};
use url::Url;

#[derive(clap::Args)]
pub struct SyncArgs {
    #[clap(long, env = "LOCAL_STORE_PATH", default_value = ".course/local.json", value_parser, value_name = "PATH")]
    store_path: PathBuf,

    #[clap(long, env = "API_BASE_URL", default_value = "http://127.0.0.1:3000", value_parser)]
    api_base_url: Url,

    #[clap(short, long, value_parser)]
    email: String,
}

pub async fn sync(args: SyncArgs) -> Result<()> {
    let api = HttpProgressApi::new(reqwest::Client::new(), args.api_base_url);
    let client = ProgressClient::new(FileStore::new(args.store_path), api);
    let session = Session::new(UserDetail::with_email(args.email));

    match client.sync(Some(&session)).await? {
        SyncOutcome::Synced { replayed } => println!("Synced {replayed} pending update(s)"),
        SyncOutcome::NothingPending => println!("Nothing to sync"),
        SyncOutcome::NoSession => println!("Sign in to sync progress"),
    }

    Ok(())
}

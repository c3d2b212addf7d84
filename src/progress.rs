use std::path::PathBuf;

use anyhow::Result;
use course_platform::{FileStore, HttpProgressApi, ProgressClient, Session, UserDetail};
use url::Url;

#[derive(clap::Args)]
pub struct ProgressArgs {
    #[clap(long, env = "LOCAL_STORE_PATH", default_value = ".course/local.json", value_parser, value_name = "PATH")]
    store_path: PathBuf,

    #[clap(long, env = "API_BASE_URL", default_value = "http://127.0.0.1:3000", value_parser)]
    api_base_url: Url,

    /// Read the signed-in copy for this user instead of the local one.
    #[clap(short, long, value_parser)]
    email: Option<String>,

    #[clap(short, long, value_parser)]
    course: String,

    #[clap(short, long, value_parser)]
    lesson: Option<String>,

    #[clap(short, long, value_parser)]
    total_chapters: Option<usize>,
}

pub async fn progress(args: ProgressArgs) -> Result<()> {
    let api = HttpProgressApi::new(reqwest::Client::new(), args.api_base_url);
    let client = ProgressClient::new(FileStore::new(args.store_path), api);
    let session = args
        .email
        .map(|email| Session::new(UserDetail::with_email(email)));

    client.load(session.as_ref()).await;

    let completion = client
        .completion(&args.course, args.lesson.as_deref(), args.total_chapters)
        .await;

    match &args.lesson {
        Some(lesson) => println!("{} / {lesson}: {completion}%", args.course),
        None => println!("{}: {completion}%", args.course),
    }

    Ok(())
}

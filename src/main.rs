use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod check;
mod progress;
mod serve;
mod sync;

#[derive(Parser)]
#[clap(name = "course-server", version)]
struct CourseServer {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the progress and content endpoints.
    Serve(serve::ServeArgs),
    /// Compare a directory of learner files with a directory of solutions.
    Check {
        #[clap(short, long, value_parser, value_name = "PATH")]
        files_path: PathBuf,

        #[clap(short, long, value_parser, value_name = "PATH")]
        solution_path: PathBuf,
    },
    /// Replay queued chapter completions against the server.
    Sync(sync::SyncArgs),
    /// Print completion for a course or lesson.
    Progress(progress::ProgressArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,hyper=warn,reqwest=warn,rustls=warn,tower_http=info")
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(feature = "env-file")]
    dotenvy::dotenv().ok();

    init_tracing();

    let course_server = CourseServer::parse();

    match course_server.command {
        Command::Serve(args) => serve::serve(args).await,
        Command::Check {
            files_path,
            solution_path,
        } => check::check(files_path, solution_path),
        Command::Sync(args) => sync::sync(args).await,
        Command::Progress(args) => progress::progress(args).await,
    }
}

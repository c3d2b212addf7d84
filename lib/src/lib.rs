pub mod accounts;
pub mod api;
pub mod cms;
pub mod compare;
pub mod content;
pub mod data;
pub mod diff;
pub mod error;
pub mod helpers;
pub mod onboarding;
pub mod progress;
pub mod raw_data;
pub mod server;
pub mod session;
pub mod store;
pub mod sync;

pub use accounts::{AccountStore, BulkWriteResult, MemoryAccounts, SqliteAccounts, UpsertProgress};
pub use api::{HttpProgressApi, ProgressApi, ProgressUpdate, UpdateProgressResponse};
pub use cms::{ContentStore, ContentfulClient, ContentfulConfig};
pub use compare::{compare_files, normalize, Comparison, ValidationState};
pub use content::ContentFetcher;
pub use data::{ChapterFiles, File, Language};
pub use error::{Error, Result};
pub use progress::{ChapterRef, CompletionMap};
pub use server::{build_router, AppState};
pub use session::{Session, UserDetail};
pub use store::{FileStore, LocalStore, MemoryStore};
pub use sync::{ProgressClient, SyncOutcome};

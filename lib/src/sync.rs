//! Client-side progress tracking: a local copy that is always written first,
//! a remote copy written when a session exists, and a queue of chapters whose
//! remote write is still owed.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::{ProgressApi, ProgressUpdate};
use crate::error::Result;
use crate::progress::{ChapterRef, CompletionMap};
use crate::session::Session;
use crate::store::{LocalStore, PENDING_UPDATES_KEY, PROGRESS_KEY};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    NoSession,
    NothingPending,
    Synced { replayed: usize },
}

/// Every read-modify-write of the local store happens while holding `store`,
/// and only one replay runs at a time, so a save racing a save or a replay
/// cannot drop an update.
pub struct ProgressClient<S, A> {
    store: Mutex<S>,
    api: A,
    progress: Mutex<CompletionMap>,
    sync_lock: Mutex<()>,
}

impl<S: LocalStore, A: ProgressApi> ProgressClient<S, A> {
    pub fn new(store: S, api: A) -> Self {
        Self {
            store: Mutex::new(store),
            api,
            progress: Mutex::new(CompletionMap::new()),
            sync_lock: Mutex::new(()),
        }
    }

    /// Last loaded or saved map.
    pub async fn progress(&self) -> CompletionMap {
        self.progress.lock().await.clone()
    }

    /// Loads the remote copy when signed in and it has entries, otherwise the
    /// local copy. Failures on either side read as "no data".
    pub async fn load(&self, session: Option<&Session>) -> CompletionMap {
        let local = match self.store.lock().await.get(PROGRESS_KEY) {
            Ok(raw) => CompletionMap::from_stored(raw.as_deref()),
            Err(err) => {
                warn!("Error reading local progress: {err}");
                CompletionMap::new()
            }
        };

        let remote = match session {
            Some(session) => match self.api.get_progress(&session.user).await {
                Ok(remote) => Some(remote),
                Err(err) => {
                    warn!("Error fetching progress: {err}");
                    None
                }
            },
            None => None,
        };

        let progress = remote.filter(|remote| !remote.is_empty()).unwrap_or(local);

        *self.progress.lock().await = progress.clone();

        progress
    }

    /// Marks a chapter completed locally, then tries the remote write. A
    /// chapter whose remote write could not happen is queued for `sync`.
    pub async fn save(&self, session: Option<&Session>, chapter: &ChapterRef) -> Result<CompletionMap> {
        let progress = {
            let mut store = self.store.lock().await;
            let mut progress = CompletionMap::from_stored(store.get(PROGRESS_KEY)?.as_deref());

            progress.mark_completed(chapter);
            store.set(PROGRESS_KEY, serde_json::to_string(&progress)?)?;

            progress
        };

        *self.progress.lock().await = progress.clone();

        match session {
            Some(session) => {
                let update = ProgressUpdate {
                    user: session.user.clone(),
                    progress: progress.clone(),
                };

                if let Err(err) = self.api.update_progress(&[update]).await {
                    warn!("Error updating progress: {err}");
                    self.enqueue(chapter).await?;
                }
            }
            None => self.enqueue(chapter).await?,
        }

        Ok(progress)
    }

    /// Replays queued chapters in one batched write. On success the replayed
    /// entries leave the queue; on failure the queue is untouched.
    pub async fn sync(&self, session: Option<&Session>) -> Result<SyncOutcome> {
        let Some(session) = session else {
            return Ok(SyncOutcome::NoSession);
        };

        let _replaying = self.sync_lock.lock().await;

        let updates = {
            let store = self.store.lock().await;
            let pending = read_pending(&*store)?;

            if pending.is_empty() {
                return Ok(SyncOutcome::NothingPending);
            }

            pending
                .iter()
                .map(|chapter| {
                    let mut progress =
                        CompletionMap::from_stored(store.get(PROGRESS_KEY)?.as_deref());
                    progress.mark_completed(chapter);

                    Ok(ProgressUpdate {
                        user: session.user.clone(),
                        progress,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        if let Err(err) = self.api.update_progress(&updates).await {
            warn!("Error syncing progress: {err}");
            return Err(err);
        }

        let replayed = updates.len();

        {
            let mut store = self.store.lock().await;
            let mut pending = read_pending(&*store)?;
            pending.drain(..replayed.min(pending.len()));

            if pending.is_empty() {
                store.remove(PENDING_UPDATES_KEY)?;
            } else {
                debug!(remaining = pending.len(), "updates queued during sync");
                store.set(PENDING_UPDATES_KEY, serde_json::to_string(&pending)?)?;
            }
        }

        info!(replayed, "synced pending progress updates");

        Ok(SyncOutcome::Synced { replayed })
    }

    pub async fn pending(&self) -> Result<Vec<ChapterRef>> {
        read_pending(&*self.store.lock().await)
    }

    pub async fn completion(
        &self,
        course_id: &str,
        lesson_id: Option<&str>,
        total_chapters: Option<usize>,
    ) -> u32 {
        self.progress
            .lock()
            .await
            .completion(course_id, lesson_id, total_chapters)
    }

    async fn enqueue(&self, chapter: &ChapterRef) -> Result<()> {
        let mut store = self.store.lock().await;
        let mut pending = read_pending(&*store)?;

        pending.push(chapter.clone());
        store.set(PENDING_UPDATES_KEY, serde_json::to_string(&pending)?)?;

        debug!(pending = pending.len(), "queued progress update");

        Ok(())
    }
}

fn read_pending<S: LocalStore + ?Sized>(store: &S) -> Result<Vec<ChapterRef>> {
    Ok(store
        .get(PENDING_UPDATES_KEY)?
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default())
}

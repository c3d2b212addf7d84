use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use course_platform::store::{PENDING_UPDATES_KEY, PROGRESS_KEY};
use course_platform::{
    ChapterRef, CompletionMap, Error, LocalStore, MemoryStore, ProgressApi, ProgressClient,
    ProgressUpdate, Result, Session, SyncOutcome, UpdateProgressResponse, UserDetail,
};
use serde_json::json;
use tokio::sync::Notify;

#[derive(Clone, Default)]
struct RecordingApi {
    failing: Arc<AtomicBool>,
    remote: Arc<Mutex<Option<CompletionMap>>>,
    batches: Arc<Mutex<Vec<Vec<ProgressUpdate>>>>,
}

impl RecordingApi {
    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn batches(&self) -> Vec<Vec<ProgressUpdate>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgressApi for RecordingApi {
    async fn get_progress(&self, _user: &UserDetail) -> Result<CompletionMap> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Config("offline".to_owned()));
        }

        Ok(self.remote.lock().unwrap().clone().unwrap_or_default())
    }

    async fn update_progress(&self, updates: &[ProgressUpdate]) -> Result<UpdateProgressResponse> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Config("offline".to_owned()));
        }

        self.batches.lock().unwrap().push(updates.to_vec());

        Ok(UpdateProgressResponse {
            success: true,
            modified: updates.len() as u64,
            inserted: 0,
        })
    }
}

fn session() -> Session {
    Session::new(UserDetail::with_email("ada@example.com"))
}

fn map(value: serde_json::Value) -> CompletionMap {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn offline_saves_queue_until_sync() {
    let api = RecordingApi::default();
    let client = ProgressClient::new(MemoryStore::new(), api.clone());
    let ch1 = ChapterRef::new("c1", "l1", "ch1");
    let ch2 = ChapterRef::new("c1", "l1", "ch2");

    client.save(None, &ch1).await.unwrap();
    let progress = client.save(None, &ch2).await.unwrap();

    assert_eq!(progress, map(json!({ "c1": { "l1": { "ch1": true, "ch2": true } } })));
    assert_eq!(client.pending().await.unwrap(), vec![ch1.clone(), ch2.clone()]);
    assert!(api.batches().is_empty());
    assert_eq!(client.completion("c1", None, None).await, 100);
    assert_eq!(client.completion("c1", Some("l1"), Some(4)).await, 50);

    assert_eq!(client.sync(None).await.unwrap(), SyncOutcome::NoSession);
    assert_eq!(client.pending().await.unwrap().len(), 2);

    let outcome = client.sync(Some(&session())).await.unwrap();

    assert_eq!(outcome, SyncOutcome::Synced { replayed: 2 });
    assert!(client.pending().await.unwrap().is_empty());

    let batches = api.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 2);
    for update in &batches[0] {
        assert_eq!(update.user.email(), Some("ada@example.com"));
        assert_eq!(update.progress, progress);
    }

    assert_eq!(
        client.sync(Some(&session())).await.unwrap(),
        SyncOutcome::NothingPending
    );
}

#[tokio::test]
async fn failed_remote_write_is_queued_and_kept_on_failed_sync() {
    let api = RecordingApi::default();
    let client = ProgressClient::new(MemoryStore::new(), api.clone());
    let chapter = ChapterRef::new("c1", "l1", "ch1");

    api.set_failing(true);
    client.save(Some(&session()), &chapter).await.unwrap();

    assert_eq!(client.pending().await.unwrap(), vec![chapter.clone()]);
    assert!(client.sync(Some(&session())).await.is_err());
    assert_eq!(client.pending().await.unwrap(), vec![chapter.clone()]);

    api.set_failing(false);
    assert_eq!(
        client.sync(Some(&session())).await.unwrap(),
        SyncOutcome::Synced { replayed: 1 }
    );
    assert!(client.pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn online_save_writes_remote_without_queueing() {
    let api = RecordingApi::default();
    let client = ProgressClient::new(MemoryStore::new(), api.clone());

    client
        .save(Some(&session()), &ChapterRef::new("c1", "l1", "ch1"))
        .await
        .unwrap();

    assert!(client.pending().await.unwrap().is_empty());
    assert_eq!(api.batches().len(), 1);
    assert_eq!(
        api.batches()[0][0].progress,
        map(json!({ "c1": { "l1": { "ch1": true } } }))
    );
}

#[tokio::test]
async fn sync_replays_against_current_local_copy() {
    let mut store = MemoryStore::new();
    store
        .set(
            PROGRESS_KEY,
            json!({ "c1": { "l1": { "ch1": true, "ch9": true } } }).to_string(),
        )
        .unwrap();
    store
        .set(
            PENDING_UPDATES_KEY,
            json!([{ "courseId": "c1", "lessonId": "l2", "chapterId": "ch1" }]).to_string(),
        )
        .unwrap();

    let api = RecordingApi::default();
    let client = ProgressClient::new(store, api.clone());

    client.sync(Some(&session())).await.unwrap();

    assert_eq!(
        api.batches()[0][0].progress,
        map(json!({ "c1": { "l1": { "ch1": true, "ch9": true }, "l2": { "ch1": true } } }))
    );
}

#[tokio::test]
async fn load_prefers_remote_then_local() {
    let mut store = MemoryStore::new();
    store
        .set(PROGRESS_KEY, json!({ "local": { "l1": { "ch1": true } } }).to_string())
        .unwrap();

    let api = RecordingApi::default();
    let client = ProgressClient::new(store, api.clone());
    let local = map(json!({ "local": { "l1": { "ch1": true } } }));
    let remote = map(json!({ "remote": { "l1": { "ch1": true } } }));

    assert_eq!(client.load(None).await, local);

    assert_eq!(client.load(Some(&session())).await, local);

    *api.remote.lock().unwrap() = Some(remote.clone());
    assert_eq!(client.load(Some(&session())).await, remote);
    assert_eq!(client.progress().await, remote);

    api.set_failing(true);
    assert_eq!(client.load(Some(&session())).await, local);
}

#[tokio::test]
async fn unparsable_local_copy_loads_as_empty() {
    let mut store = MemoryStore::new();
    store.set(PROGRESS_KEY, "{not json".to_owned()).unwrap();

    let client = ProgressClient::new(store, RecordingApi::default());

    assert!(client.load(None).await.is_empty());
    assert_eq!(client.completion("c1", None, None).await, 0);
}

#[tokio::test]
async fn concurrent_saves_keep_every_chapter() {
    let api = RecordingApi::default();
    let client = Arc::new(ProgressClient::new(MemoryStore::new(), api));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                client
                    .save(None, &ChapterRef::new("c1", "l1", format!("ch{i}")))
                    .await
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    let progress = client.load(None).await;
    assert_eq!(progress.completion("c1", Some("l1"), Some(16)), 100);
    assert_eq!(client.pending().await.unwrap().len(), 16);
}

/// Holds every batched write until `release` is notified.
#[derive(Clone, Default)]
struct GatedApi {
    entered: Arc<Notify>,
    release: Arc<Notify>,
    batches: Arc<Mutex<Vec<Vec<ProgressUpdate>>>>,
}

#[async_trait]
impl ProgressApi for GatedApi {
    async fn get_progress(&self, _user: &UserDetail) -> Result<CompletionMap> {
        Ok(CompletionMap::new())
    }

    async fn update_progress(&self, updates: &[ProgressUpdate]) -> Result<UpdateProgressResponse> {
        self.entered.notify_one();
        self.release.notified().await;
        self.batches.lock().unwrap().push(updates.to_vec());

        Ok(UpdateProgressResponse {
            success: true,
            modified: updates.len() as u64,
            inserted: 0,
        })
    }
}

#[tokio::test]
async fn save_during_sync_stays_queued() {
    let api = GatedApi::default();
    let client = Arc::new(ProgressClient::new(MemoryStore::new(), api.clone()));
    let first = ChapterRef::new("c1", "l1", "a");
    let second = ChapterRef::new("c1", "l1", "b");

    client.save(None, &first).await.unwrap();

    let syncing = {
        let client = Arc::clone(&client);
        tokio::spawn(async move { client.sync(Some(&session())).await })
    };

    api.entered.notified().await;
    client.save(None, &second).await.unwrap();
    api.release.notify_one();

    assert_eq!(
        syncing.await.unwrap().unwrap(),
        SyncOutcome::Synced { replayed: 1 }
    );
    assert_eq!(client.pending().await.unwrap(), vec![second.clone()]);

    let batches = api.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert!(batches[0][0].progress.is_completed(&first));
    assert!(!batches[0][0].progress.is_completed(&second));
    assert!(client.load(None).await.is_completed(&second));
}

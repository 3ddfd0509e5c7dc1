use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::{sync::Notify, task::JoinHandle, time};
use tracing::{debug, error, info};
use uuid::Uuid;

use super::{
    codec::{buffer_to_data_url, FALLBACK_MIME},
    models::Photo,
    photos::{normalize_title, PhotoService},
    ports::{Camera, Exporter},
};

/// The in-memory feed a UI renders from: an ordered list of photos kept in
/// sync by optimistic updates on local actions and a periodic full refresh
/// for photos saved by other party guests.
pub struct FeedService {
    photos: PhotoService,
    camera: Arc<dyn Camera>,
    exporter: Arc<dyn Exporter>,
    feed: Mutex<Vec<Photo>>,
    saving: AtomicBool,
}

/// Clears the saving flag when a capture finishes, on every exit path.
struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl FeedService {
    pub fn new(photos: PhotoService, camera: Arc<dyn Camera>, exporter: Arc<dyn Exporter>) -> Self {
        FeedService {
            photos,
            camera,
            exporter,
            feed: Mutex::new(Vec::new()),
            saving: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current feed, newest first.
    pub fn photos(&self) -> Vec<Photo> {
        self.feed.lock().unwrap().clone()
    }

    /// Initial full fetch.
    pub async fn load(&self) {
        let photos = self.photos.list().await;
        *self.feed.lock().unwrap() = photos;
    }

    /// Grab a frame from the camera, save it, and prepend the result.
    ///
    /// `Ok(None)` means the camera had nothing to capture, a dismissible
    /// no-op. The feed is only touched after the save is confirmed; on a
    /// failed save the list stays exactly as it was.
    pub async fn capture_and_save(&self, title: Option<&str>) -> Result<Option<Photo>> {
        self.saving.store(true, Ordering::SeqCst);
        let _guard = SavingGuard(&self.saving);

        let Some(frame) = self.camera.capture_frame().await? else {
            info!("Camera returned no frame, nothing to save");
            return Ok(None);
        };

        let data_url = buffer_to_data_url(&frame, FALLBACK_MIME);
        let photo = self.photos.save(&data_url, title).await?;

        self.feed.lock().unwrap().insert(0, photo.clone());
        Ok(Some(photo))
    }

    /// Delete a photo, dropping it from the feed only once the store
    /// confirmed the removal.
    pub async fn remove(&self, id: &Uuid) -> bool {
        if !self.photos.delete(id).await {
            return false;
        }
        self.feed.lock().unwrap().retain(|p| p.id != *id);
        true
    }

    /// Rename a photo, patching the local entry on success.
    pub async fn rename(&self, id: &Uuid, title: &str) -> bool {
        if !self.photos.rename_title(id, title).await {
            return false;
        }
        let title = normalize_title(Some(title));
        if let Some(photo) = self.feed.lock().unwrap().iter_mut().find(|p| p.id == *id) {
            photo.title = title;
        }
        true
    }

    pub async fn share(&self, id: &Uuid) -> Result<()> {
        let photo = self.find(id)?;
        self.exporter.share(&photo).await
    }

    pub async fn download(&self, id: &Uuid) -> Result<()> {
        let photo = self.find(id)?;
        self.exporter.download(&photo).await
    }

    fn find(&self, id: &Uuid) -> Result<Photo> {
        self.feed
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == *id)
            .cloned()
            .ok_or_else(|| anyhow!("photo {} is not in the feed", id))
    }

    /// Re-fetch the full list, unless a capture/save is in flight.
    ///
    /// The flag check is advisory, not a lock: a refresh racing a save may
    /// briefly show stale ordering and self-corrects on the next tick.
    pub async fn refresh(&self) {
        if self.saving.load(Ordering::SeqCst) {
            debug!("Skipping refresh while a save is in flight");
            return;
        }
        let photos = self.photos.list().await;
        *self.feed.lock().unwrap() = photos;
    }

    /// Start the periodic refresh task. Dropping the returned handle leaks
    /// the task; call [`RefreshHandle::stop`] for a clean shutdown.
    pub fn spawn_refresh(self: &Arc<Self>, period: Duration) -> RefreshHandle {
        let feed = Arc::clone(self);
        let stop = Arc::new(Notify::new());
        let stop_signal = Arc::clone(&stop);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => feed.refresh().await,
                    _ = stop_signal.notified() => break,
                }
            }
            debug!("Refresh task stopped");
        });

        RefreshHandle { task, stop }
    }
}

/// Stop handle for the periodic refresh task.
pub struct RefreshHandle {
    task: JoinHandle<()>,
    stop: Arc<Notify>,
}

impl RefreshHandle {
    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(self) {
        self.stop.notify_one();
        if let Err(e) = self.task.await {
            error!("Refresh task did not shut down cleanly: {}", e);
        }
    }
}

use std::sync::Arc;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;

use crate::client::api::UploadApi;
use crate::client::events::ImageUploaded;
use crate::features::images::dtos::ImageRecordDto;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch images. Please try again later.";

/// What the gallery currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryView {
    /// First fetch outstanding and nothing loaded yet
    Loading,
    Error(String),
    Empty,
    Grid(Vec<ImageRecordDto>),
}

pub struct Gallery;

impl Gallery {
    /// Start the gallery task: fetch now, then again on every upload notification
    /// or retry request. The task lives as long as the returned handle.
    pub fn mount(
        api: Arc<dyn UploadApi>,
        notifications: broadcast::Receiver<ImageUploaded>,
    ) -> GalleryHandle {
        let (view_tx, view_rx) = watch::channel(GalleryView::Loading);
        let retry = Arc::new(Notify::new());

        let task = tokio::spawn(run(api, notifications, view_tx, Arc::clone(&retry)));

        GalleryHandle {
            view: view_rx,
            retry,
            task,
        }
    }
}

/// Mounted gallery; dropping it unmounts
pub struct GalleryHandle {
    view: watch::Receiver<GalleryView>,
    retry: Arc<Notify>,
    task: JoinHandle<()>,
}

impl GalleryHandle {
    #[allow(dead_code)]
    pub fn view(&self) -> GalleryView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GalleryView> {
        self.view.clone()
    }

    /// Fetch again, e.g. from the "Try Again" action of the error view
    #[allow(dead_code)]
    pub fn retry(&self) {
        self.retry.notify_one();
    }
}

impl Drop for GalleryHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    api: Arc<dyn UploadApi>,
    mut notifications: broadcast::Receiver<ImageUploaded>,
    view: watch::Sender<GalleryView>,
    retry: Arc<Notify>,
) {
    let mut listening = true;
    refresh(api.as_ref(), &view).await;

    loop {
        let should_fetch = tokio::select! {
            received = notifications.recv(), if listening => match received {
                Ok(event) => {
                    tracing::debug!("Gallery refresh after upload of {}", event.public_id);
                    true
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Gallery missed {} upload notifications", skipped);
                    true
                }
                Err(broadcast::error::RecvError::Closed) => {
                    listening = false;
                    false
                }
            },
            _ = retry.notified() => true,
        };

        if should_fetch {
            refresh(api.as_ref(), &view).await;
        }
    }
}

async fn refresh(api: &dyn UploadApi, view: &watch::Sender<GalleryView>) {
    // Loaded images stay on screen while re-fetching
    view.send_if_modified(|current| match current {
        GalleryView::Error(_) => {
            *current = GalleryView::Loading;
            true
        }
        _ => false,
    });

    let next = match api.list().await {
        Ok(images) if images.is_empty() => GalleryView::Empty,
        Ok(images) => GalleryView::Grid(images),
        Err(e) => {
            tracing::error!("Error fetching images: {}", e);
            GalleryView::Error(FETCH_FAILED_MESSAGE.to_string())
        }
    };

    view.send_replace(next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::client::api::ClientError;
    use crate::client::events::UploadNotifier;
    use crate::client::form::SelectedFile;
    use crate::features::images::dtos::UploadResponseDto;
    use crate::shared::test_helpers::base_time;

    /// `UploadApi` whose list results are scripted; the last one repeats
    struct ScriptedList {
        responses: Mutex<VecDeque<Result<Vec<ImageRecordDto>, ClientError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedList {
        fn new(responses: Vec<Result<Vec<ImageRecordDto>, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UploadApi for ScriptedList {
        async fn upload(&self, _file: &SelectedFile) -> Result<UploadResponseDto, ClientError> {
            Err(ClientError::Transport("not scripted".to_string()))
        }

        async fn list(&self) -> Result<Vec<ImageRecordDto>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            match responses.len() {
                0 => Ok(vec![]),
                1 => match &responses[0] {
                    Ok(images) => Ok(images.clone()),
                    Err(_) => Err(ClientError::Transport("still down".to_string())),
                },
                _ => responses.pop_front().unwrap(),
            }
        }
    }

    fn image(n: usize) -> ImageRecordDto {
        ImageRecordDto {
            public_id: format!("ImageUploader/img-{}", n),
            url: format!("https://media.test/ImageUploader/img-{}.png", n),
            created_at: base_time(),
        }
    }

    fn uploaded_event() -> ImageUploaded {
        ImageUploaded {
            public_id: "ImageUploader/img-2".to_string(),
            url: "https://media.test/ImageUploader/img-2.png".to_string(),
        }
    }

    async fn wait_for_view(
        handle: &GalleryHandle,
        predicate: impl FnMut(&GalleryView) -> bool,
    ) -> GalleryView {
        let mut views = handle.subscribe();
        let view = views.wait_for(predicate).await.unwrap().clone();
        view
    }

    #[tokio::test]
    async fn test_mount_shows_empty_state() {
        let api = ScriptedList::new(vec![Ok(vec![])]);
        let notifier = UploadNotifier::new();

        let gallery = Gallery::mount(api, notifier.subscribe());

        assert_eq!(
            wait_for_view(&gallery, |view| *view != GalleryView::Loading).await,
            GalleryView::Empty
        );
    }

    #[tokio::test]
    async fn test_upload_notification_refreshes_grid() {
        let api = ScriptedList::new(vec![Ok(vec![image(1)]), Ok(vec![image(2), image(1)])]);
        let notifier = UploadNotifier::new();
        let gallery = Gallery::mount(api.clone(), notifier.subscribe());
        wait_for_view(&gallery, |view| matches!(view, GalleryView::Grid(_))).await;

        assert_eq!(notifier.notify(uploaded_event()), 1);

        let view = wait_for_view(
            &gallery,
            |view| matches!(view, GalleryView::Grid(images) if images.len() == 2),
        )
        .await;
        assert_eq!(view, GalleryView::Grid(vec![image(2), image(1)]));
        assert_eq!(api.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_then_retry() {
        let api = ScriptedList::new(vec![
            Err(ClientError::Transport("connection refused".to_string())),
            Ok(vec![image(1)]),
        ]);
        let notifier = UploadNotifier::new();
        let gallery = Gallery::mount(api, notifier.subscribe());

        assert_eq!(
            wait_for_view(&gallery, |view| *view != GalleryView::Loading).await,
            GalleryView::Error(FETCH_FAILED_MESSAGE.to_string())
        );

        gallery.retry();

        assert_eq!(
            wait_for_view(&gallery, |view| matches!(view, GalleryView::Grid(_))).await,
            GalleryView::Grid(vec![image(1)])
        );
    }

    #[tokio::test]
    async fn test_unmounted_gallery_stops_listening() {
        let api = ScriptedList::new(vec![Ok(vec![])]);
        let notifier = UploadNotifier::new();
        let gallery = Gallery::mount(api.clone(), notifier.subscribe());
        wait_for_view(&gallery, |view| *view == GalleryView::Empty).await;

        drop(gallery);
        tokio::task::yield_now().await;

        notifier.notify(uploaded_event());
        tokio::task::yield_now().await;
        assert_eq!(api.calls(), 1);
    }
}

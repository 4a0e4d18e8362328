use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

/// Broadcast after an upload completes and the form has reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUploaded {
    pub public_id: String,
    pub url: String,
}

/// Fire-and-forget fan-out from the form to any mounted gallery
#[derive(Debug, Clone)]
pub struct UploadNotifier {
    sender: broadcast::Sender<ImageUploaded>,
}

impl UploadNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ImageUploaded> {
        self.sender.subscribe()
    }

    /// Returns how many listeners received the event; zero when nothing is mounted
    pub fn notify(&self, event: ImageUploaded) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for UploadNotifier {
    fn default() -> Self {
        Self::new()
    }
}

use async_trait::async_trait;

use crate::client::api::ClientError;
use crate::features::images::dtos::ImageRecordDto;

pub const SHARE_TITLE: &str = "Check out this image!";

/// Host capabilities the gallery actions rely on
#[async_trait]
pub trait Platform: Send + Sync {
    fn supports_native_share(&self) -> bool;

    /// Open a URL outside the gallery (new tab, external viewer, ...)
    async fn open(&self, url: &str) -> Result<(), ClientError>;

    async fn share(&self, title: &str, url: &str) -> Result<(), ClientError>;

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    CopiedToClipboard,
}

pub fn view_full_size(image: &ImageRecordDto) -> &str {
    &image.url
}

pub async fn download(platform: &dyn Platform, image: &ImageRecordDto) -> Result<(), ClientError> {
    platform.open(&image.url).await
}

/// Native share when available, otherwise the URL goes to the clipboard
pub async fn share(
    platform: &dyn Platform,
    image: &ImageRecordDto,
) -> Result<ShareOutcome, ClientError> {
    if platform.supports_native_share() {
        platform.share(SHARE_TITLE, &image.url).await?;
        Ok(ShareOutcome::Shared)
    } else {
        platform.copy_to_clipboard(&image.url).await?;
        Ok(ShareOutcome::CopiedToClipboard)
    }
}

/// Platform for the terminal: nothing to open or share, so URLs are printed
pub struct TerminalPlatform;

#[async_trait]
impl Platform for TerminalPlatform {
    fn supports_native_share(&self) -> bool {
        false
    }

    async fn open(&self, url: &str) -> Result<(), ClientError> {
        println!("{}", url);
        Ok(())
    }

    async fn share(&self, title: &str, url: &str) -> Result<(), ClientError> {
        println!("{}: {}", title, url);
        Ok(())
    }

    async fn copy_to_clipboard(&self, text: &str) -> Result<(), ClientError> {
        println!("{}", text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::shared::test_helpers::base_time;

    #[derive(Default)]
    struct RecordingPlatform {
        native_share: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Platform for RecordingPlatform {
        fn supports_native_share(&self) -> bool {
            self.native_share
        }

        async fn open(&self, url: &str) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push(format!("open {}", url));
            Ok(())
        }

        async fn share(&self, title: &str, url: &str) -> Result<(), ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("share {} {}", title, url));
            Ok(())
        }

        async fn copy_to_clipboard(&self, text: &str) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push(format!("copy {}", text));
            Ok(())
        }
    }

    fn image() -> ImageRecordDto {
        ImageRecordDto {
            public_id: "ImageUploader/abc".to_string(),
            url: "https://media.test/ImageUploader/abc.png".to_string(),
            created_at: base_time(),
        }
    }

    #[tokio::test]
    async fn test_share_uses_native_share_when_supported() {
        let platform = RecordingPlatform {
            native_share: true,
            ..Default::default()
        };

        let outcome = share(&platform, &image()).await.unwrap();

        assert_eq!(outcome, ShareOutcome::Shared);
        assert_eq!(
            *platform.calls.lock().unwrap(),
            vec!["share Check out this image! https://media.test/ImageUploader/abc.png"]
        );
    }

    #[tokio::test]
    async fn test_share_falls_back_to_clipboard() {
        let platform = RecordingPlatform::default();

        let outcome = share(&platform, &image()).await.unwrap();

        assert_eq!(outcome, ShareOutcome::CopiedToClipboard);
        assert_eq!(
            *platform.calls.lock().unwrap(),
            vec!["copy https://media.test/ImageUploader/abc.png"]
        );
    }

    #[tokio::test]
    async fn test_download_and_full_size_use_image_url() {
        let platform = RecordingPlatform::default();
        let image = image();

        download(&platform, &image).await.unwrap();

        assert_eq!(view_full_size(&image), image.url);
        assert_eq!(
            *platform.calls.lock().unwrap(),
            vec!["open https://media.test/ImageUploader/abc.png"]
        );
    }
}

use async_trait::async_trait;
use reqwest::{redirect, Client, ClientBuilder};
use tracing::debug;

use crate::cache::ImageFetcher;
use crate::config::CacheConfig;
use crate::error::FetchError;
use crate::image_url::{optimize_image_url, ImageSize};

const USER_AGENT: &str = "FoodSwipe/0.1";

/// Downloads images over HTTP so the OS and proxy caches are warm.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    config: CacheConfig,
    size: ImageSize,
}

impl HttpImageFetcher {
    pub fn new(client: Client, config: CacheConfig) -> Self {
        Self {
            client,
            config,
            size: ImageSize::default(),
        }
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    /// The card-sized rendition actually downloaded for `uri`.
    pub fn request_url(&self, uri: &str) -> String {
        optimize_image_url(uri, self.size)
    }

    pub fn client() -> Result<Client, FetchError> {
        let client = ClientBuilder::new()
            .redirect(redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(client)
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn prefetch(&self, uri: &str) -> Result<(), FetchError> {
        let url = url::Url::parse(&self.request_url(uri))
            .map_err(|_| FetchError::InvalidUri(uri.to_owned()))?;
        let response = self
            .client
            .get(url)
            .timeout(self.config.request_timeout())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                uri: uri.to_owned(),
                status,
            });
        }

        let bytes = response.bytes().await?;
        debug!(uri, bytes = bytes.len(), "image downloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_card_sized_renditions() {
        let fetcher = HttpImageFetcher::new(Client::new(), CacheConfig::default()).with_size(
            ImageSize {
                width: 200,
                height: 300,
                quality: 60,
            },
        );
        assert_eq!(
            fetcher.request_url("https://images.unsplash.com/photo-9?w=1600"),
            "https://images.unsplash.com/photo-9?w=200&h=300&fit=crop&q=60"
        );
        assert_eq!(
            fetcher.request_url("https://i.pinimg.com/736x/aa/bb/cc/dd.jpg"),
            "https://i.pinimg.com/200x300/aa/bb/cc/dd.jpg"
        );
        assert_eq!(
            fetcher.request_url("http://127.0.0.1:8080/pasta.jpg"),
            "http://127.0.0.1:8080/pasta.jpg"
        );
    }
}

use anyhow::{anyhow, Context, Result};
use granary_config::AppConfig;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use std::path::Path;
use std::time::Duration;

#[derive(Clone)]
pub struct GcsClient {
    endpoint: String,
    token: String,
    http: Client,
}

impl GcsClient {
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        let timeout = Duration::from_secs_f64(cfg.timeout_seconds.max(1.0));
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to construct reqwest client")?;

        Ok(Self {
            endpoint: cfg.storage_endpoint.clone(),
            token: cfg.storage_token.clone(),
            http,
        })
    }

    fn base_url(&self) -> Result<Url> {
        Url::parse(&self.endpoint).context("invalid storage endpoint URL")
    }

    pub fn bucket(&self, name: &str) -> Bucket<'_> {
        Bucket {
            client: self,
            name: name.to_string(),
        }
    }
}

pub struct Bucket<'a> {
    client: &'a GcsClient,
    name: String,
}

impl Bucket<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object(&self, key: &str) -> ObjectHandle<'_> {
        ObjectHandle {
            bucket: self,
            key: key.to_string(),
        }
    }
}

pub struct ObjectHandle<'a> {
    bucket: &'a Bucket<'a>,
    key: String,
}

impl ObjectHandle<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn upload_from_file(&self, path: &Path) -> Result<()> {
        let payload = std::fs::read(path)
            .with_context(|| format!("failed to read batch file {}", path.display()))?;
        self.upload(payload).await
    }

    // Single-request media upload; the object key travels in the `name` query
    // parameter so slashes in the key survive percent-encoding.
    async fn upload(&self, payload: Vec<u8>) -> Result<()> {
        let client = self.bucket.client;

        let mut url = client.base_url()?;
        url.set_path(&format!("/upload/storage/v1/b/{}/o", self.bucket.name));
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", &self.key);

        let mut req = client
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload);

        if !client.token.is_empty() {
            req = req.bearer_auth(client.token.clone());
        }

        let response = req.send().await.context("storage upload request failed")?;
        let status = response.status();
        let text = response.text().await.with_context(|| {
            format!("failed to read storage response body (status {})", status)
        })?;

        if !status.is_success() {
            return Err(anyhow!("storage backend returned {}: {}", status, text));
        }

        Ok(())
    }
}

//! The server-facing half of the host: view URLs, multipart upload, blob fetch.

use crate::error::{BridgeError, BridgeResult};
use crate::reference::AssetRef;
use futures::future::BoxFuture;
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Multipart upload as the `/upload/image` endpoint expects it.
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub kind: String,
    pub subfolder: String,
    pub overwrite: bool,
}

/// Raw upload outcome. Success is not implied; callers check `ok`.
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub ok: bool,
    pub status: u16,
    pub body: Vec<u8>,
}

impl UploadResponse {
    pub fn json(&self) -> BridgeResult<UploadReceipt> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Where the server actually stored an upload.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub name: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub trait HostApi: Send + Sync {
    /// Absolute retrieval URL for a stored asset.
    fn view_url(&self, asset: &AssetRef) -> Url;

    fn upload<'a>(&'a self, form: UploadForm) -> BoxFuture<'a, BridgeResult<UploadResponse>>;

    /// Fetches an absolute or server-relative URL as bytes.
    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, BridgeResult<Vec<u8>>>;
}

#[derive(Clone)]
pub struct ComfyClient {
    http: reqwest::Client,
    server: Url,
    api_prefix: String,
}

impl ComfyClient {
    pub fn new(server_url: &str, api_prefix: &str) -> BridgeResult<Self> {
        let server =
            Url::parse(server_url).map_err(|e| BridgeError::url(format!("{server_url}: {e}")))?;
        Ok(Self {
            http: reqwest::Client::new(),
            server,
            api_prefix: api_prefix.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, route: &str) -> Url {
        let mut url = self.server.clone();
        let base = self.server.path().trim_end_matches('/');
        url.set_path(&format!("{base}{}{route}", self.api_prefix));
        url
    }

    fn resolve(&self, url: &str) -> BridgeResult<Url> {
        // join() returns absolute inputs unchanged
        self.server
            .join(url)
            .map_err(|e| BridgeError::url(format!("{url}: {e}")))
    }
}

impl HostApi for ComfyClient {
    fn view_url(&self, asset: &AssetRef) -> Url {
        let mut url = self.api_url("/view");
        url.query_pairs_mut()
            .append_pair("filename", &asset.filename)
            .append_pair("type", asset.kind_or_input())
            .append_pair("subfolder", &asset.subfolder);
        url
    }

    fn upload<'a>(&'a self, form: UploadForm) -> BoxFuture<'a, BridgeResult<UploadResponse>> {
        Box::pin(async move {
            let part = Part::bytes(form.bytes)
                .file_name(form.filename)
                .mime_str(&form.mime)?;
            let multipart = Form::new()
                .part("image", part)
                .text("type", form.kind)
                .text("subfolder", form.subfolder)
                .text("overwrite", form.overwrite.to_string());

            let response = self
                .http
                .post(self.api_url("/upload/image"))
                .multipart(multipart)
                .send()
                .await?;
            let status = response.status();
            let body = response.bytes().await?.to_vec();
            Ok(UploadResponse {
                ok: status.is_success(),
                status: status.as_u16(),
                body,
            })
        })
    }

    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, BridgeResult<Vec<u8>>> {
        Box::pin(async move {
            let url = self.resolve(url)?;
            let response = self.http.get(url).send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_url_carries_all_three_parameters() {
        let client = ComfyClient::new("http://127.0.0.1:8188", "/api").unwrap();
        let url = client.view_url(&AssetRef::input("a b.glb", ""));
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8188/api/view?filename=a+b.glb&type=input&subfolder="
        );
    }

    #[test]
    fn server_path_prefix_is_kept() {
        let client = ComfyClient::new("https://host.example/comfy/", "/api/").unwrap();
        let url = client.view_url(&AssetRef::new("x.png", "renders", "output"));
        assert_eq!(url.path(), "/comfy/api/view");
        assert!(url.query().unwrap().contains("subfolder=renders"));
    }

    #[test]
    fn relative_urls_resolve_against_the_server() {
        let client = ComfyClient::new("http://localhost:8188", "/api").unwrap();
        let url = client.resolve("/api/view?filename=x.png").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8188/api/view?filename=x.png");
    }

    #[test]
    fn receipt_tolerates_missing_subfolder() {
        let response = UploadResponse {
            ok: true,
            status: 200,
            body: br#"{"name":"out123.png"}"#.to_vec(),
        };
        let receipt = response.json().unwrap();
        assert_eq!(receipt.name, "out123.png");
        assert_eq!(receipt.subfolder, "");
    }

    #[test]
    fn bad_url_is_rejected() {
        assert!(ComfyClient::new("not a url", "/api").is_err());
    }
}

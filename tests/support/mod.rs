#![allow(dead_code)]

use futures::future::BoxFuture;
use mesh2motion_bridge::{
    AssetRef, BridgeError, BridgeResult, HostApi, UploadForm, UploadResponse,
};
use reqwest::Url;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

/// In-memory stand-in for the ComfyUI server.
pub struct FakeApi {
    response: UploadResponse,
    blobs: HashMap<String, Vec<u8>>,
    pub uploads: Mutex<Vec<UploadForm>>,
}

impl FakeApi {
    pub fn storing_as(name: &str, subfolder: &str) -> Self {
        let body = serde_json::json!({ "name": name, "subfolder": subfolder, "type": "input" });
        Self {
            response: UploadResponse {
                ok: true,
                status: 200,
                body: serde_json::to_vec(&body).unwrap(),
            },
            blobs: HashMap::new(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            response: UploadResponse {
                ok: false,
                status,
                body: body.as_bytes().to_vec(),
            },
            blobs: HashMap::new(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn with_blob(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.blobs.insert(url.to_string(), bytes);
        self
    }

    pub fn last_upload(&self) -> UploadForm {
        self.uploads.lock().unwrap().last().cloned().expect("no upload recorded")
    }
}

impl HostApi for FakeApi {
    fn view_url(&self, asset: &AssetRef) -> Url {
        let mut url = Url::parse("http://comfy.test/api/view").unwrap();
        url.query_pairs_mut()
            .append_pair("filename", &asset.filename)
            .append_pair("type", asset.kind_or_input())
            .append_pair("subfolder", &asset.subfolder);
        url
    }

    fn upload<'a>(&'a self, form: UploadForm) -> BoxFuture<'a, BridgeResult<UploadResponse>> {
        self.uploads.lock().unwrap().push(form);
        let response = self.response.clone();
        Box::pin(async move { Ok(response) })
    }

    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, BridgeResult<Vec<u8>>> {
        let found = self.blobs.get(url).cloned();
        Box::pin(async move { found.ok_or_else(|| BridgeError::url(format!("no blob at {url}"))) })
    }
}

/// A small encoded PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A small encoded JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Jpeg).unwrap();
    out.into_inner()
}

use std::{
    collections::HashMap,
    io::{Cursor, Write},
    sync::{Arc, Mutex},
};

use serde_json::{json, Value};
use zip::{write::FileOptions, ZipWriter};

use super::{ApiError, ApiResponse, Transport};

pub(crate) const API: &str = "https://api.github.com";

/// Canned responses keyed by url. Unknown urls answer 404. Every request is recorded.
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<HashMap<String, ApiResponse>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub(crate) fn with_repository(owner: &str, name: &str, default_branch: &str) -> Arc<Self> {
        let transport = Arc::new(FakeTransport::default());
        transport.json(
            &format!("{API}/repos/{owner}/{name}"),
            json!({
                "name": name,
                "owner": { "login": owner },
                "full_name": format!("{owner}/{name}"),
                "default_branch": default_branch,
            }),
        );
        transport
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), ApiResponse { status, body });
    }

    pub(crate) fn json(&self, url: &str, value: Value) {
        self.respond(url, 200, serde_json::to_vec(&value).unwrap());
    }

    pub(crate) fn bytes(&self, url: &str, body: Vec<u8>) {
        self.respond(url, 200, body);
    }

    pub(crate) fn status(&self, url: &str, status: u16) {
        self.respond(url, status, Vec::new());
    }

    pub(crate) fn git_ref(&self, owner: &str, name: &str, path: &str, sha: &str) {
        self.json(
            &format!("{API}/repos/{owner}/{name}/git/refs/{path}"),
            json!({
                "ref": format!("refs/{path}"),
                "object": { "sha": sha, "type": "commit" },
            }),
        );
    }

    pub(crate) fn release(&self, owner: &str, name: &str, tag: &str) {
        self.json(
            &format!("{API}/repos/{owner}/{name}/releases/latest"),
            json!({ "tag_name": tag, "name": tag, "draft": false, "prerelease": false }),
        );
    }

    pub(crate) fn zipball(&self, owner: &str, name: &str, commit: &str, archive: Vec<u8>) {
        self.bytes(
            &format!("{API}/repos/{owner}/{name}/zipball/{commit}"),
            archive,
        );
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.as_str() == url)
            .count()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<ApiResponse, ApiError> {
        self.calls.lock().unwrap().push(url.to_string());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(ApiResponse {
                status: 404,
                body: b"{\"message\": \"Not Found\"}".to_vec(),
            }))
    }
}

/// Zip archive with `files` placed under the `top` directory, the way forges serve snapshots.
pub(crate) fn snapshot_zip(top: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .add_directory(format!("{top}/"), FileOptions::default())
        .unwrap();
    for (path, contents) in files {
        writer
            .start_file(format!("{top}/{path}"), FileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

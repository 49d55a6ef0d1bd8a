//! Artifact download to local storage.
//!
//! # Design
//! Downloads go through `Client::build_request` like every API call, so the
//! token rides along as a query parameter. The body is streamed straight
//! from the ureq reader into the destination file instead of being buffered;
//! artifacts can be large. On any failure after the file was created, the
//! partial file is removed before the error is returned.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use url::Url;

use crate::client::Client;
use crate::error::ApiError;
use crate::http::{self, HttpMethod, HttpRequest};
use crate::types::Artifact;

impl Client {
    /// Download `artifact` into `target_dir`, returning the local file path.
    ///
    /// The file name is the last non-empty path segment of the artifact URL
    /// with the query string dropped, so `.../tmp/out.log?branch=x` lands as
    /// `out.log`. The destination file is created (or truncated) before the
    /// request is issued and its handle is released on every exit path.
    pub fn download_artifact(
        &self,
        artifact: &Artifact,
        target_dir: &Path,
    ) -> Result<PathBuf, ApiError> {
        let req = self.build_request(HttpMethod::Get, &artifact.url, &[])?;
        let resolved = Url::parse(&req.url).map_err(|e| ApiError::MalformedUrl(e.to_string()))?;
        let file_name = file_name_from_url(&resolved).ok_or_else(|| {
            ApiError::MalformedUrl(format!("no file name in artifact URL: {}", artifact.url))
        })?;
        let destination = target_dir.join(file_name);
        info!("downloading {} to {}", artifact.url, destination.display());

        let mut out =
            File::create(&destination).map_err(|e| ApiError::Filesystem(e.to_string()))?;
        let result = self.fetch_into(&req, &mut out);
        drop(out);

        if let Err(err) = result {
            // Do not leave a truncated artifact behind.
            let _ = fs::remove_file(&destination);
            return Err(err);
        }
        Ok(destination)
    }

    fn fetch_into(&self, req: &HttpRequest, out: &mut File) -> Result<(), ApiError> {
        let mut response = http::send(&self.agent, req)?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            if status == 404 {
                return Err(ApiError::NotFound);
            }
            let body = response.body_mut().read_to_string().unwrap_or_default();
            return Err(ApiError::Http { status, body });
        }

        let mut reader = response.into_body().into_reader();
        io::copy(&mut reader, out).map_err(|e| ApiError::Filesystem(e.to_string()))?;
        Ok(())
    }
}

/// Last non-empty path segment of `url`, query string excluded.
fn file_name_from_url(url: &Url) -> Option<&str> {
    url.path_segments()?.filter(|segment| !segment.is_empty()).last()
}

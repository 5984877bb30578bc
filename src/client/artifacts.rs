//! Job artifact selection, naming and download plumbing

use std::path::{Path, PathBuf};

use bytes::Bytes;
use compact_str::{format_compact, CompactString};
use futures_util::{Stream, TryStreamExt};
use reqwest::Response;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, warn};

use super::error::{ClientError, Result};
use crate::{domain::ArtifactsFile, id::JobId};

/// Which artifact to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSelector {
    /// The archive of the latest successful job named `job_name` on `ref_name`
    ByRefAndName { ref_name: CompactString, job_name: CompactString },
    /// The whole archive of a job
    ByJobId(JobId),
    /// A single archived file, as listed in a job record
    ByJobIdAndFile { job_id: JobId, file: ArtifactsFile },
    /// A single archived file by its path inside the archive
    ByJobIdAndPath { job_id: JobId, path: CompactString },
}

/// Where the downloaded bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactOutput {
    /// Save into the directory, or the system temp directory when `None`.
    /// An existing file with the same name is overwritten.
    ToFile(Option<PathBuf>),
    /// Hand the response body to the caller
    ToStream,
}

#[derive(Debug)]
pub enum ArtifactDownload {
    Saved(PathBuf),
    Stream(ArtifactStream),
}

impl ArtifactDownload {
    /// Path of the saved file; `None` for a stream.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ArtifactDownload::Saved(path) => Some(path),
            ArtifactDownload::Stream(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<ArtifactStream> {
        match self {
            ArtifactDownload::Saved(_) => None,
            ArtifactDownload::Stream(stream) => Some(stream),
        }
    }
}

impl ArtifactSelector {
    pub fn by_ref(ref_name: impl Into<CompactString>, job_name: impl Into<CompactString>) -> Self {
        Self::ByRefAndName { ref_name: ref_name.into(), job_name: job_name.into() }
    }

    pub fn by_path(job_id: JobId, path: impl Into<CompactString>) -> Self {
        Self::ByJobIdAndPath { job_id, path: path.into() }
    }

    /// API path below `/projects/{id}`, query included.
    pub(crate) fn endpoint(&self) -> Result<CompactString> {
        match self {
            ArtifactSelector::ByRefAndName { ref_name, job_name } => {
                if ref_name.is_empty() || job_name.is_empty() {
                    return Err(ClientError::invalid_argument("ref and job name are required"));
                }
                Ok(format_compact!(
                    "/jobs/artifacts/{}/download?job={}",
                    urlencoding::encode(ref_name),
                    urlencoding::encode(job_name)
                ))
            },
            ArtifactSelector::ByJobId(job_id) => Ok(format_compact!("/jobs/{job_id}/artifacts")),
            ArtifactSelector::ByJobIdAndFile { job_id, file } => Ok(format_compact!(
                "/jobs/{job_id}/artifacts/{}",
                encode_artifact_path(&file.filename)?
            )),
            ArtifactSelector::ByJobIdAndPath { job_id, path } => Ok(format_compact!(
                "/jobs/{job_id}/artifacts/{}",
                encode_artifact_path(path)?
            )),
        }
    }

    /// Name of the file written by [`ArtifactOutput::ToFile`].
    pub fn file_name(&self) -> Result<CompactString> {
        match self {
            ArtifactSelector::ByRefAndName { job_name, .. } => {
                Ok(format_compact!("{}-artifacts.zip", last_component(job_name)?))
            },
            ArtifactSelector::ByJobId(job_id) => Ok(format_compact!("job-{job_id}-artifacts.zip")),
            ArtifactSelector::ByJobIdAndFile { file, .. } => last_component(&file.filename),
            ArtifactSelector::ByJobIdAndPath { path, .. } => last_component(path),
        }
    }
}

/// Percent-encodes each segment of an archive path, keeping the separators.
/// Empty, `.` and `..` segments are rejected; the URL parser would resolve
/// them against the endpoint.
fn encode_artifact_path(path: &str) -> Result<CompactString> {
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        return Err(ClientError::invalid_argument("artifact path is empty"));
    }

    let mut segments = Vec::new();
    for segment in path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(ClientError::invalid_argument(format!(
                "invalid segment '{segment}' in artifact path '{path}'"
            )));
        }
        segments.push(urlencoding::encode(segment));
    }

    Ok(segments.join("/").into())
}

fn last_component(path: &str) -> Result<CompactString> {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .map(CompactString::from)
        .ok_or_else(|| ClientError::invalid_argument(format!("no file name in artifact path '{path}'")))
}

/// Live body of an artifact download. Dropping it releases the connection.
#[derive(Debug)]
pub struct ArtifactStream {
    response: Response,
}

impl ArtifactStream {
    pub(crate) fn new(response: Response) -> Self {
        Self { response }
    }

    /// Content length announced by the server, if any
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Next chunk of the body, `None` at the end.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(self.response.chunk().await?)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> {
        self.response.bytes_stream().map_err(ClientError::Http)
    }

    /// Copies the remaining body into `path`, truncating any existing file.
    /// On failure the partially written file is left behind.
    pub async fn save_to(mut self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let mut file = File::create(path)
            .await
            .map_err(|e| ClientError::io(path, e))?;

        let mut written = 0u64;
        while let Some(chunk) = self.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| ClientError::io(path, e))?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| ClientError::io(path, e))?;
        debug!(path = %path.display(), bytes = written, "Artifact saved");

        Ok(written)
    }
}

/// Target path for a download into `directory` (temp dir by default).
pub(crate) fn target_path(directory: Option<&Path>, file_name: &str) -> PathBuf {
    match directory {
        Some(dir) => dir.join(file_name),
        None => std::env::temp_dir().join(file_name),
    }
}

/// Saves the stream and reports where it went; on failure, logs the
/// partial file so it can be discarded.
pub(crate) async fn save(stream: ArtifactStream, target: PathBuf) -> Result<ArtifactDownload> {
    match stream.save_to(&target).await {
        Ok(_) => Ok(ArtifactDownload::Saved(target)),
        Err(e) => {
            warn!(path = %target.display(), error = %e, "Artifact download incomplete");
            Err(e)
        },
    }
}

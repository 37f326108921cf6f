use crate::errors::UploadError;
use crate::util::percent;
use reqwest::blocking::{multipart, Client};
use std::io::{self, Cursor, Read};
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A raw dataset picked by the user, held in memory until it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Dataset {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let bytes = std::fs::read(path).map_err(|source| UploadError::Dataset {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, bytes })
    }
}

/// Sends a dataset for analysis and hands back the raw response body.
///
/// `progress` receives whole percentages as the payload goes out. The body
/// is not interpreted here; validating it is the loader's job.
pub trait UploadService {
    fn upload(&self, dataset: &Dataset, progress: &mut dyn FnMut(u8))
        -> Result<String, UploadError>;
}

/// Multipart `POST` of the dataset under the form field `file`.
pub struct HttpUploadService {
    client: Client,
    endpoint: String,
}

impl HttpUploadService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl UploadService for HttpUploadService {
    fn upload(
        &self,
        dataset: &Dataset,
        progress: &mut dyn FnMut(u8),
    ) -> Result<String, UploadError> {
        let total = dataset.bytes.len() as u64;
        let (tx, rx) = mpsc::channel();
        let reader = ProgressReader::new(dataset.bytes.clone(), tx);
        let part = multipart::Part::reader_with_length(reader, total)
            .file_name(dataset.file_name.clone());
        let form = multipart::Form::new().part("file", part);
        let request = self.client.post(&self.endpoint).multipart(form);
        info!(endpoint = %self.endpoint, file = %dataset.file_name, bytes = total, "uploading dataset");

        // The request runs on a scoped worker so progress can be forwarded
        // from this thread while the body streams out. The channel closes
        // when the body reader is dropped.
        thread::scope(|scope| {
            let worker = scope.spawn(move || -> Result<String, UploadError> {
                let response = request.send()?;
                let status = response.status();
                if !status.is_success() {
                    return Err(UploadError::Status(status.as_u16()));
                }
                Ok(response.text()?)
            });
            for pct in rx {
                progress(pct);
            }
            match worker.join() {
                Ok(outcome) => {
                    if let Err(e) = &outcome {
                        warn!(error = %e, "upload failed");
                    } else {
                        debug!("upload finished");
                    }
                    outcome
                }
                Err(_) => Err(UploadError::Interrupted),
            }
        })
    }
}

/// Counts bytes as the HTTP client pulls them and reports each new percentage.
struct ProgressReader {
    inner: Cursor<Vec<u8>>,
    total: u64,
    sent: u64,
    last: Option<u8>,
    tx: Sender<u8>,
}

impl ProgressReader {
    fn new(bytes: Vec<u8>, tx: Sender<u8>) -> Self {
        let total = bytes.len() as u64;
        Self {
            inner: Cursor::new(bytes),
            total,
            sent: 0,
            last: None,
            tx,
        }
    }
}

impl Read for ProgressReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.sent += n as u64;
        let pct = percent(self.sent, self.total);
        if self.last.map_or(true, |last| pct > last) {
            self.last = Some(pct);
            // The receiver only goes away once the upload is over.
            let _ = self.tx.send(pct);
        }
        Ok(n)
    }
}

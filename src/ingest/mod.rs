//! Upload pipeline
//!
//! An upload is inspected, its bytes written to blob storage and the result
//! recorded in the catalog as the document's newest file. Uploads run either
//! inside the request (`ingest.eager`) or on a background worker fed through
//! a bounded flume channel.

pub mod inspect;

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::core::config::IngestConfig;
use crate::core::documents::DocumentFile;
use crate::core::error::{Error, Result};
use crate::core::types::DocumentId;
use crate::storage::{Catalog, NewDocumentFile, SharedFileStorage};
use crate::system::metrics::Metrics;

pub use inspect::{inspect, FileInfo};

/// A file received from a client
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name supplied by the uploader
    pub filename: String,
    /// Free text comment
    pub comment: String,
    /// Raw content
    pub content: Bytes,
}

/// Turns uploads into document files
pub struct Ingestor {
    catalog: Arc<Catalog>,
    files: SharedFileStorage,
}

impl Ingestor {
    /// Create an ingestor writing into `catalog` and `files`
    pub fn new(catalog: Arc<Catalog>, files: SharedFileStorage) -> Self {
        Self { catalog, files }
    }

    /// Process one upload synchronously
    pub fn ingest(&self, document_id: DocumentId, upload: Upload) -> Result<DocumentFile> {
        let metrics = &Metrics::global().ingest;
        let result = crate::time_operation!(metrics.duration, self.store(document_id, upload));

        match &result {
            Ok(file) => {
                metrics.files_ingested.inc();
                metrics.bytes_ingested.inc_by(file.size);
                info!(
                    document_id = %document_id,
                    file_id = %file.id,
                    mimetype = %file.mimetype,
                    pages = file.page_count,
                    "document file created"
                );
            }
            Err(e) => {
                metrics.files_failed.inc();
                warn!(document_id = %document_id, error = %e, "upload failed");
            }
        }
        result
    }

    fn store(&self, document_id: DocumentId, upload: Upload) -> Result<DocumentFile> {
        let info = inspect(&upload.content);
        let storage_key = uuid::Uuid::new_v4().simple().to_string();
        self.files.put(&storage_key, upload.content)?;

        let recorded = self.catalog.add_file(NewDocumentFile {
            document_id,
            filename: upload.filename,
            comment: upload.comment,
            checksum: info.checksum,
            mimetype: info.mimetype,
            encoding: info.encoding,
            size: info.size,
            page_count: info.page_count,
            storage_key: storage_key.clone(),
        });

        if recorded.is_err() {
            // The document vanished while the blob was written
            if let Err(e) = self.files.delete(&storage_key) {
                warn!(key = %storage_key, error = %e, "failed to remove orphaned blob");
            }
        }
        recorded
    }
}

/// Outcome of handing an upload to the pipeline
#[derive(Debug)]
pub enum Submission {
    /// The file was created before returning
    Completed(DocumentFile),
    /// The file will be created by the background worker
    Queued,
}

struct Job {
    document_id: DocumentId,
    upload: Upload,
    reply: Option<oneshot::Sender<Result<DocumentFile>>>,
}

enum Mode {
    Eager,
    Background(flume::Sender<Job>),
}

/// Entry point for uploads, eager or queued depending on configuration
pub struct IngestQueue {
    ingestor: Arc<Ingestor>,
    mode: Mode,
}

impl IngestQueue {
    /// Create the queue; in background mode this spawns the worker task
    /// and must be called inside a Tokio runtime.
    pub fn start(ingestor: Arc<Ingestor>, config: &IngestConfig) -> Self {
        if config.eager {
            info!("ingest running in eager mode");
            return Self {
                ingestor,
                mode: Mode::Eager,
            };
        }

        let (sender, receiver) = flume::bounded(config.queue_capacity);
        tokio::spawn(run_worker(ingestor.clone(), receiver));
        info!(capacity = config.queue_capacity, "ingest worker started");

        Self {
            ingestor,
            mode: Mode::Background(sender),
        }
    }

    /// Whether uploads complete inside the request
    pub fn is_eager(&self) -> bool {
        matches!(self.mode, Mode::Eager)
    }

    /// Hand an upload to the pipeline
    pub async fn submit(&self, document_id: DocumentId, upload: Upload) -> Result<Submission> {
        match &self.mode {
            Mode::Eager => {
                let file = ingest_blocking(self.ingestor.clone(), document_id, upload).await?;
                Ok(Submission::Completed(file))
            }
            Mode::Background(sender) => {
                enqueue(sender, Job { document_id, upload, reply: None }).await?;
                Ok(Submission::Queued)
            }
        }
    }

    /// Hand an upload to the pipeline and wait until its file exists
    pub async fn submit_and_wait(
        &self,
        document_id: DocumentId,
        upload: Upload,
    ) -> Result<DocumentFile> {
        match &self.mode {
            Mode::Eager => ingest_blocking(self.ingestor.clone(), document_id, upload).await,
            Mode::Background(sender) => {
                let (reply, response) = oneshot::channel();
                enqueue(sender, Job { document_id, upload, reply: Some(reply) }).await?;
                response
                    .await
                    .map_err(|_| Error::internal("ingest worker dropped the upload"))?
            }
        }
    }
}

async fn enqueue(sender: &flume::Sender<Job>, job: Job) -> Result<()> {
    let metrics = &Metrics::global().ingest;
    metrics.queue_depth.inc();
    if sender.send_async(job).await.is_err() {
        metrics.queue_depth.dec();
        return Err(Error::internal("ingest worker is not running"));
    }
    Ok(())
}

async fn ingest_blocking(
    ingestor: Arc<Ingestor>,
    document_id: DocumentId,
    upload: Upload,
) -> Result<DocumentFile> {
    tokio::task::spawn_blocking(move || ingestor.ingest(document_id, upload))
        .await
        .map_err(|e| Error::internal(format!("ingest task failed: {}", e)))?
}

async fn run_worker(ingestor: Arc<Ingestor>, receiver: flume::Receiver<Job>) {
    while let Ok(job) = receiver.recv_async().await {
        Metrics::global().ingest.queue_depth.dec();
        debug!(
            document_id = %job.document_id,
            filename = %job.upload.filename,
            "processing upload"
        );

        let result = ingest_blocking(ingestor.clone(), job.document_id, job.upload).await;
        if let Err(e) = &result {
            error!(document_id = %job.document_id, error = %e, "background upload failed");
        }
        if let Some(reply) = job.reply {
            let _ = reply.send(result);
        }
    }
    info!("ingest worker stopped");
}

//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{DestinationCatalog, DestinationConfig, MIN_PART_SIZE};
use crate::error::{Error, Result, ResultExt};
use crate::object_storage::{
    build_object_key, CompletedUpload, FormattedPart, ObjectKey, ObjectLoaderPartLoader,
    ObjectStoreClient, PartFactory, PartResult, UploadCompleter, UploadsInProgress,
};
use crate::pipeline::{BatchAccumulator, BatchAccumulatorResult};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Capacity of the channel between part workers and the completer
const RESULT_CHANNEL_CAPACITY: usize = 64;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Upload {
                catalog,
                stream,
                input,
                key,
                upload_id,
                workers,
                part_size,
            } => {
                let mut config = self.load_config()?;
                if let Some(workers) = workers {
                    config.part_workers = *workers;
                }
                if let Some(part_size) = part_size {
                    config.part_size_bytes = *part_size;
                }
                config.validate()?;

                let catalog = DestinationCatalog::from_file(catalog)?;
                self.upload(
                    config,
                    catalog,
                    stream,
                    input,
                    key.as_deref(),
                    upload_id.as_deref(),
                )
                .await
            }
            Commands::Check => self.check(),
        }
    }

    fn config_path(&self) -> Result<&PathBuf> {
        self.cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("--config is required"))
    }

    fn load_config(&self) -> Result<DestinationConfig> {
        DestinationConfig::from_file(self.config_path()?)
    }

    fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        if config.part_size_bytes < MIN_PART_SIZE {
            warn!(
                part_size_bytes = config.part_size_bytes,
                "Part size is below the 5 MiB minimum of S3-compatible stores"
            );
        }
        let client = ObjectStoreClient::from_url(&config.destination)?;
        println!(
            "{}",
            serde_json::json!({
                "type": "CONNECTION_STATUS",
                "status": "SUCCEEDED",
                "scheme": client.destination().scheme(),
                "config": config,
            })
        );
        Ok(())
    }

    async fn upload(
        &self,
        config: DestinationConfig,
        catalog: DestinationCatalog,
        stream_name: &str,
        input: &Path,
        key: Option<&str>,
        upload_id: Option<&str>,
    ) -> Result<()> {
        let start = Instant::now();
        let stream = catalog.get_stream(stream_name)?;
        let object_key = match key {
            Some(key) => key.to_string(),
            None => {
                let file_name = input
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| Error::config(format!("Invalid input file: {}", input.display())))?;
                build_object_key(config.path_prefix.as_deref(), &stream.full_name(), file_name)
            }
        };

        let data = Bytes::from(
            tokio::fs::read(input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?,
        );
        let size = data.len();
        let parts = PartFactory::new(&object_key).split(data, config.part_size_bytes)?;
        if self.cli.verbose {
            eprintln!("Uploading {size} bytes as {} parts", parts.len());
        }

        let mut key = ObjectKey::new(stream_name, object_key);
        if let Some(upload_id) = upload_id {
            key = key.with_upload_id(upload_id);
        }

        let client = Arc::new(ObjectStoreClient::from_url(&config.destination)?);
        let workers = config.part_workers;
        let loader = Arc::new(ObjectLoaderPartLoader::new(
            client,
            Arc::new(catalog),
            Arc::new(UploadsInProgress::new()),
            Arc::new(config),
        ));

        let completed = upload_parts(loader, key, parts, workers).await?;
        for done in &completed {
            println!(
                "{}",
                serde_json::json!({
                    "type": "UPLOAD_COMPLETE",
                    "upload": done,
                    "bytes": size,
                    "duration_ms": start.elapsed().as_millis() as u64,
                })
            );
        }
        Ok(())
    }
}

/// Upload `parts` of one object with `workers` concurrent workers
///
/// Parts are dealt round-robin and every worker starts the same key, so the
/// workers race to open the upload. The session writes parts in submission
/// order, so appends take turns in index order. Results flow to an
/// [`UploadCompleter`].
pub async fn upload_parts(
    loader: Arc<ObjectLoaderPartLoader>,
    key: ObjectKey,
    parts: Vec<FormattedPart>,
    workers: usize,
) -> Result<Vec<CompletedUpload>> {
    let workers = workers.max(1);
    let mut buckets: Vec<Vec<(usize, FormattedPart)>> = (0..workers).map(|_| Vec::new()).collect();
    for (position, part) in parts.into_iter().enumerate() {
        buckets[position % workers].push((position, part));
    }

    // Position of the next part to append; `None` once a worker has failed
    let (turn, _) = watch::channel(Some(0usize));
    let turn = Arc::new(turn);
    let (tx, mut rx) = mpsc::channel::<PartResult>(RESULT_CHANNEL_CAPACITY);
    let mut tasks = JoinSet::new();
    for (worker, bucket) in buckets.into_iter().enumerate() {
        let loader = Arc::clone(&loader);
        let key = key.clone();
        let turn = Arc::clone(&turn);
        let tx = tx.clone();
        tasks.spawn(async move {
            let result = run_worker(worker, &loader, &key, bucket, &turn, tx).await;
            if result.is_err() {
                turn.send_replace(None);
            }
            result
        });
    }
    drop(tx);

    let mut completer = UploadCompleter::new(Arc::clone(loader.uploads()));
    while let Some(result) = rx.recv().await {
        completer.accept(result).await?;
    }
    while let Some(joined) = tasks.join_next().await {
        joined??;
    }

    if !completer.pending().is_empty() {
        return Err(Error::Other(format!(
            "Uploads left incomplete: {}",
            completer.pending().join(", ")
        )));
    }
    info!(uploads = completer.completed().len(), "All uploads complete");
    Ok(completer.completed().to_vec())
}

async fn run_worker(
    worker: usize,
    loader: &ObjectLoaderPartLoader,
    key: &ObjectKey,
    parts: Vec<(usize, FormattedPart)>,
    turn: &watch::Sender<Option<usize>>,
    tx: mpsc::Sender<PartResult>,
) -> Result<()> {
    let send = |result: PartResult| {
        let tx = tx.clone();
        async move {
            tx.send(result)
                .await
                .map_err(|_| Error::Other("Part result channel closed".to_string()))
        }
    };

    let mut state = loader.start(key).await?;
    let mut turns = turn.subscribe();
    for (position, part) in parts {
        let aborted = turns
            .wait_for(|next| next.is_none() || *next == Some(position))
            .await
            .map_err(|_| Error::Other("Part sequencer closed".to_string()))?
            .is_none();
        if aborted {
            debug!(worker, object_key = %key.object_key, "Stopping after another worker failed");
            return Ok(());
        }

        let result = loader.accept(part, state).await?;
        turn.send_modify(|next| {
            if let Some(next) = next {
                *next += 1;
            }
        });
        match result {
            BatchAccumulatorResult::Intermediate { state: next, output } => {
                send(output).await?;
                state = next;
            }
            BatchAccumulatorResult::Final { output } => {
                send(output).await?;
                return Ok(());
            }
        }
    }

    let finished = loader.finish(state).await?;
    send(finished.into_output()).await?;
    debug!(worker, object_key = %key.object_key, "Worker done");
    Ok(())
}

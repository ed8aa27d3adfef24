use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use regen_core::{SpecOrigin, SyncConfig};
use regen_generator::Generator;
use regen_sync::{pipeline, CycleResult};

use crate::error::{io_err, WatchError};

/// What the watch runtime operates on.
pub struct WatchOptions {
    pub spec_path: PathBuf,
    pub output_dir: PathBuf,
    pub template_dir: Option<PathBuf>,
    pub generator: Arc<dyn Generator + Send + Sync>,
    pub config: SyncConfig,
    /// Run one cycle at startup before entering the poll loop.
    pub initial_sync: bool,
    /// Optional sink for per-cycle outcomes. Outcomes are always logged;
    /// this exists for callers that want to react to them.
    pub events: Option<mpsc::UnboundedSender<CycleEvent>>,
}

/// Outcome of one watch-triggered sync cycle.
#[derive(Debug, Clone)]
pub enum CycleEvent {
    Completed(CycleResult),
    Failed(String),
}

/// Debounce state for the watched spec. A change arms (or re-arms) a
/// deadline; the cycle fires only once the spec has been quiet for the
/// whole window, so rapid successive saves collapse into one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Idle,
    Pending { deadline: Instant },
}

fn arm(now: Instant, window: Duration) -> DebounceState {
    DebounceState::Pending {
        deadline: now + window,
    }
}

fn take_due(state: &mut DebounceState, now: Instant) -> bool {
    match *state {
        DebounceState::Pending { deadline } if now >= deadline => {
            *state = DebounceState::Idle;
            true
        }
        _ => false,
    }
}

/// Start the watch runtime and block the current thread until it exits.
pub fn start_blocking(options: WatchOptions) -> Result<(), WatchError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;

    let (shutdown_tx, _) = broadcast::channel::<()>(16);
    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        runtime.spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                signal = tokio::signal::ctrl_c() => {
                    if signal.is_ok() {
                        tracing::info!("received ctrl-c, stopping watch");
                    }
                    let _ = shutdown.send(());
                }
            }
        })
    };

    let result = runtime.block_on(run(options, shutdown_tx));
    signal_handle.abort();
    result
}

/// Run the watch runtime. Exits cleanly when `shutdown` fires.
pub async fn run(options: WatchOptions, shutdown: broadcast::Sender<()>) -> Result<(), WatchError> {
    if let SpecOrigin::Remote(url) = SpecOrigin::parse(&options.spec_path.to_string_lossy()) {
        return Err(WatchError::RemoteSpec { url });
    }

    let (job_tx, job_rx) = mpsc::channel::<&'static str>(16);

    let poller_handle = {
        let shutdown_tx = shutdown.clone();
        let spec_path = options.spec_path.clone();
        let poll_interval = options.config.poll_interval;
        let debounce_window = options.config.debounce_window;
        let initial_sync = options.initial_sync;
        let job_tx = job_tx.clone();
        tokio::spawn(async move {
            let result = poller_task(
                spec_path,
                poll_interval,
                debounce_window,
                initial_sync,
                job_tx,
                shutdown_tx.subscribe(),
            )
            .await;
            let _ = shutdown_tx.send(());
            result
        })
    };
    drop(job_tx);

    let processor_handle = {
        let shutdown_tx = shutdown.clone();
        tokio::spawn(async move {
            let result = cycle_processor_task(options, job_rx, shutdown_tx.subscribe()).await;
            let _ = shutdown_tx.send(());
            result
        })
    };

    let (poller_result, processor_result) = tokio::join!(poller_handle, processor_handle);
    handle_join("poller", poller_result)?;
    handle_join("cycle_processor", processor_result)?;
    Ok(())
}

/// Poll the spec file for content changes and enqueue debounced cycles.
async fn poller_task(
    spec_path: PathBuf,
    poll_interval: Duration,
    debounce_window: Duration,
    initial_sync: bool,
    job_tx: mpsc::Sender<&'static str>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), WatchError> {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut last_seen = match spec_fingerprint(&spec_path) {
        Ok(fingerprint) => fingerprint,
        Err(err) => {
            tracing::warn!("spec poll failed: {err}");
            None
        }
    };
    let mut missing_reported = false;
    let mut debounce = DebounceState::Idle;

    if initial_sync && job_tx.send("startup").await.is_err() {
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                // Poll failures are per-tick problems (file swapped for a
                // directory, permissions in flux); the loop keeps waiting.
                let current = match spec_fingerprint(&spec_path) {
                    Ok(current) => current,
                    Err(err) => {
                        tracing::warn!("spec poll failed: {err}");
                        continue;
                    }
                };
                if current.is_none() {
                    if !missing_reported {
                        tracing::warn!("spec file missing: {}", spec_path.display());
                        missing_reported = true;
                    }
                } else {
                    missing_reported = false;
                }

                if current != last_seen {
                    tracing::debug!("spec change observed: {}", spec_path.display());
                    last_seen = current;
                    debounce = arm(Instant::now(), debounce_window);
                }

                // A closed queue means the processor is gone; exit quietly.
                if take_due(&mut debounce, Instant::now())
                    && job_tx.send("spec-change").await.is_err()
                {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Run queued sync cycles one at a time. Shutdown is observed only
/// between cycles; an in-flight cycle always runs to completion so the
/// output directory is never left mid-apply.
async fn cycle_processor_task(
    options: WatchOptions,
    mut job_rx: mpsc::Receiver<&'static str>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), WatchError> {
    let origin = SpecOrigin::Local(options.spec_path.clone());

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_job = job_rx.recv() => {
                let Some(reason) = maybe_job else { break };
                tracing::info!("sync cycle starting ({reason})");

                let origin = origin.clone();
                let output_dir = options.output_dir.clone();
                let template_dir = options.template_dir.clone();
                let generator = options.generator.clone();
                let config = options.config.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    pipeline::run_once(
                        &origin,
                        &output_dir,
                        template_dir.as_deref(),
                        generator.as_ref(),
                        &config,
                        false,
                    )
                })
                .await
                .map_err(|_| WatchError::ChannelClosed("cycle task"))?;

                let event = match outcome {
                    Ok(result) => {
                        tracing::info!(
                            "cycle done: {} written, {} deleted, {} unchanged",
                            result.written.len(),
                            result.deleted.len(),
                            result.unchanged
                        );
                        CycleEvent::Completed(result)
                    }
                    // Resolve/generate failures keep the loop alive; the
                    // next spec change gets a fresh attempt.
                    Err(err) => {
                        tracing::error!("cycle failed: {err}");
                        CycleEvent::Failed(err.to_string())
                    }
                };
                if let Some(events) = &options.events {
                    let _ = events.send(event);
                }
            }
        }
    }

    Ok(())
}

/// (mtime, content hash) fingerprint of the watched file, `None` when it
/// does not currently exist. Content hashing catches editors that write
/// without advancing mtime granularity.
fn spec_fingerprint(path: &Path) -> Result<Option<(SystemTime, String)>, WatchError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    let mtime = metadata.modified().map_err(|e| io_err(path, e))?;
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_err(path, err)),
    };
    Ok(Some((mtime, hex::encode(Sha256::digest(&content)))))
}

fn handle_join(
    task: &'static str,
    result: Result<Result<(), WatchError>, tokio::task::JoinError>,
) -> Result<(), WatchError> {
    match result {
        Ok(inner) => inner,
        Err(err) if err.is_cancelled() => Ok(()),
        Err(_) => Err(WatchError::ChannelClosed(task)),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

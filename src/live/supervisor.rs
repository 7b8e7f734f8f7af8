//! Connection supervision: one live connection at a time, forever.
//!
//! Each connection runs four cooperatively-cancellable tasks - capture,
//! uplink, receive/accumulate, translate - joined by two bounded queues.
//! The supervisor bounds every connection to a wall-clock cap below the
//! provider's own session lifetime, captures resumption tokens as they
//! arrive, and reconnects with the newest one so the server restores prior
//! context. Only user cancellation stops the loop.

use crate::audio::{AudioFrame, CpalFrameSource};
use crate::config::{Config, FlushConfig};
use crate::defaults;
use crate::error::{ParleyError, Result};
use crate::lang::{self, SourceMode};
use crate::ledger::SessionLedger;
use crate::live::accumulator::{Chunk, TranscriptAccumulator};
use crate::live::event::LiveEvent;
use crate::live::session::{self, LiveReceiver, LiveSender};
use crate::translate::TranslationClient;
use crate::translate::worker::{TranslationWorker, WorkerConfig};
use owo_colors::OwoColorize;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::Instant;
use tracing::{info, warn};

/// Opaque handle permitting reconnection with preserved server context.
///
/// Superseded, never merged: each update replaces the previous token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumptionToken(String);

impl ResumptionToken {
    pub fn new(handle: String) -> Self {
        Self(handle)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Why a connection ended.
#[derive(Debug)]
enum ConnectionOutcome {
    /// Our wall-clock cap expired - the scheduled reconnect boundary.
    TimedOut,
    /// The server closed the stream before our cap.
    Closed,
    /// User-initiated cancellation.
    Cancelled,
}

/// Everything one supervisor run needs to know.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub mode: SourceMode,
    pub live_model: String,
    pub device: Option<String>,
    pub sample_rate: u32,
    pub frame_size: usize,
    pub session_timeout: Duration,
    pub reconnect_backoff: Duration,
    pub flush: FlushConfig,
    pub worker: WorkerConfig,
}

impl SupervisorConfig {
    pub fn from_config(config: &Config, mode: SourceMode) -> Self {
        Self {
            mode,
            live_model: config.live.model.clone(),
            device: config.audio.device.clone(),
            sample_rate: config.audio.sample_rate,
            frame_size: config.audio.frame_size,
            session_timeout: Duration::from_secs(config.live.session_timeout_secs),
            reconnect_backoff: Duration::from_secs(config.live.reconnect_backoff_secs),
            flush: config.flush.clone(),
            worker: WorkerConfig::new(mode, &config.translate),
        }
    }

    /// System instruction for the live session, if the mode fixes one.
    fn instruction(&self) -> Option<&'static str> {
        match self.mode {
            SourceMode::Bilingual(lang) => Some(lang.instruction()),
            SourceMode::Mixed => None,
        }
    }
}

/// Owns the per-connection lifecycle and the reconnect loop.
pub struct ConnectionSupervisor {
    config: SupervisorConfig,
    api_key: String,
    translator: Arc<dyn TranslationClient>,
    ledger: Arc<Mutex<SessionLedger>>,
}

impl ConnectionSupervisor {
    pub fn new(
        config: SupervisorConfig,
        api_key: String,
        translator: Arc<dyn TranslationClient>,
        ledger: Arc<Mutex<SessionLedger>>,
    ) -> Self {
        Self {
            config,
            api_key,
            translator,
            ledger,
        }
    }

    /// Run connections until the user cancels.
    ///
    /// Transient failures reconnect after a fixed backoff, with the last
    /// known resumption token if any was issued. The ledger persists across
    /// reconnects, so sequence numbers continue rather than reset.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut resume_token: Option<ResumptionToken> = None;

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            match self.run_connection(&mut resume_token, shutdown.clone()).await {
                Ok(ConnectionOutcome::Cancelled) => return Ok(()),
                Ok(ConnectionOutcome::TimedOut) => {
                    eprintln!("{}", "[session cap reached - reconnecting...]".dimmed());
                    info!("session timeout boundary, reconnecting with resumption token");
                    continue;
                }
                Ok(ConnectionOutcome::Closed) => {
                    warn!("server closed the stream early");
                }
                Err(e) => {
                    eprintln!(
                        "{}",
                        format!(
                            "[connection error: {} - reconnecting in {}s...]",
                            e,
                            self.config.reconnect_backoff.as_secs()
                        )
                        .yellow()
                    );
                    warn!("connection failed: {}", e);
                }
            }

            // Backoff before reconnecting, unless cancellation arrives first
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_backoff) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Run a single bounded connection.
    ///
    /// Teardown order is fixed: stop capture/uplink, flush the residual
    /// buffer into the chunk queue, close the queue, then give the
    /// translate task a bounded grace period to drain and persist.
    async fn run_connection(
        &self,
        resume_token: &mut Option<ResumptionToken>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<ConnectionOutcome> {
        let resumed = resume_token.is_some();
        let (sender, mut receiver) = session::connect(
            &self.api_key,
            &self.config.live_model,
            self.config.instruction(),
            resume_token.as_ref().map(ResumptionToken::as_str),
        )
        .await?;

        let status = if resumed { "Resumed!" } else { "Connected!" };
        eprintln!("{}", status.green());

        // Bounded queues joining the four tasks
        let (frame_tx, frame_rx) = mpsc::channel::<AudioFrame>(defaults::FRAME_QUEUE_CAPACITY);
        let (chunk_tx, chunk_rx) = mpsc::channel::<Chunk>(defaults::CHUNK_QUEUE_CAPACITY);

        // Per-connection stop signal for capture and uplink
        let (conn_stop_tx, conn_stop_rx) = watch::channel(false);

        // Capture/uplink failures surface here; both count as a stream
        // failure and trigger a reconnect. The original sender stays alive
        // so recv() below only yields on an actual fault.
        let (fault_tx, mut fault_rx) = mpsc::channel::<ParleyError>(2);

        let capture_task = tokio::spawn(run_capture(
            self.config.device.clone(),
            self.config.frame_size,
            frame_tx,
            conn_stop_rx.clone(),
            fault_tx.clone(),
        ));

        let uplink_task = tokio::spawn(run_uplink(
            sender,
            frame_rx,
            self.config.sample_rate,
            conn_stop_rx,
            fault_tx.clone(),
        ));

        let worker = TranslationWorker::new(self.config.worker.clone(), self.translator.clone());
        let worker_task = tokio::spawn(worker.run(
            chunk_rx,
            shutdown.clone(),
            self.ledger.clone(),
        ));

        // Receive/accumulate runs here so the supervisor observes the
        // outcome directly
        let mut accumulator = TranscriptAccumulator::new(self.config.mode, &self.config.flush);
        let deadline = Instant::now() + self.config.session_timeout;

        let outcome = 'conn: loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    break 'conn Ok(ConnectionOutcome::TimedOut);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break 'conn Ok(ConnectionOutcome::Cancelled);
                    }
                }
                fault = fault_rx.recv() => {
                    if let Some(e) = fault {
                        break 'conn Err(e);
                    }
                }
                events = receiver.next_events() => {
                    match events {
                        Ok(Some(events)) => {
                            for event in events {
                                self.display_event(&event);
                                if let LiveEvent::ResumptionUpdate { handle } = &event {
                                    *resume_token = Some(ResumptionToken::new(handle.clone()));
                                }
                                if let Some(chunk) = accumulator.absorb(&event) {
                                    println!();
                                    if chunk_tx.send(chunk).await.is_err() {
                                        // Translate task is gone; nothing
                                        // downstream can accept work
                                        break 'conn Ok(ConnectionOutcome::Closed);
                                    }
                                }
                            }
                        }
                        Ok(None) => break 'conn Ok(ConnectionOutcome::Closed),
                        Err(e) => break 'conn Err(e),
                    }
                }
            }
        };

        // Teardown: stop audio first, then flush the residual utterance so
        // no chunk is silently dropped
        let _ = conn_stop_tx.send(true);
        if let Some(chunk) = accumulator.flush_residual() {
            println!();
            let _ = chunk_tx.send(chunk).await;
        }
        drop(chunk_tx);

        let _ = capture_task.await;
        let _ = uplink_task.await;

        // Bounded grace for in-flight translations to land in the ledger
        if tokio::time::timeout(defaults::DRAIN_GRACE, worker_task)
            .await
            .is_err()
        {
            warn!("translate task did not drain within the grace period");
        }

        outcome
    }

    /// Stream accepted fragments to stdout as they arrive.
    fn display_event(&self, event: &LiveEvent) {
        match event {
            LiveEvent::Fragment(text) => {
                if lang::is_noise_marker(text) || self.config.mode.accepts(text) {
                    print!("{}", text);
                    let _ = std::io::stdout().flush();
                }
            }
            LiveEvent::CloseWarning { time_left } => {
                let remaining = time_left.as_deref().unwrap_or("unknown");
                eprintln!(
                    "{}",
                    format!("[server closing connection, time left: {}]", remaining).dimmed()
                );
            }
            LiveEvent::Interrupted
            | LiveEvent::SetupComplete
            | LiveEvent::ResumptionUpdate { .. } => {}
        }
    }
}

/// Capture task: owns the audio device for the lifetime of one connection.
///
/// Polls the device buffer, cuts it into fixed-size frames, and pushes them
/// into the frame queue in capture order. On device failure it stops and
/// signals closure by returning; retry policy belongs to the supervisor.
async fn run_capture(
    device: Option<String>,
    frame_size: usize,
    frame_tx: mpsc::Sender<AudioFrame>,
    mut stop: watch::Receiver<bool>,
    fault_tx: mpsc::Sender<ParleyError>,
) {
    let mut source = match CpalFrameSource::new(device.as_deref()).and_then(|mut s| {
        s.start()?;
        Ok(s)
    }) {
        Ok(source) => source,
        Err(e) => {
            let _ = fault_tx.try_send(e);
            return;
        }
    };

    let mut pending: Vec<i16> = Vec::new();
    let mut sequence: u64 = 0;
    // Poll at ~60Hz; the cpal callback keeps filling between reads
    let mut poll = tokio::time::interval(Duration::from_millis(16));

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let samples = match source.read_samples() {
                    Ok(s) => s,
                    Err(e) => {
                        let _ = fault_tx.try_send(e);
                        break;
                    }
                };
                pending.extend(samples);

                while pending.len() >= frame_size {
                    let frame: Vec<i16> = pending.drain(..frame_size).collect();
                    sequence += 1;
                    // Queue full means the uplink is stalled; dropping the
                    // frame keeps capture realtime
                    if frame_tx.try_send(AudioFrame::new(frame, sequence)).is_err()
                        && frame_tx.is_closed()
                    {
                        break;
                    }
                }
                if frame_tx.is_closed() {
                    break;
                }
            }
            _ = stop.changed() => {
                if *stop.borrow() {
                    break;
                }
            }
        }
    }

    let _ = source.stop();
}

/// Uplink task: drains the frame queue FIFO and forwards to the session.
///
/// Uses a short poll timeout so the stop signal is observed promptly even
/// when the queue is empty. Forwarding failure stops the task without
/// retry - reconnection is the supervisor's job.
async fn run_uplink(
    mut sender: LiveSender,
    mut frame_rx: mpsc::Receiver<AudioFrame>,
    sample_rate: u32,
    stop: watch::Receiver<bool>,
    fault_tx: mpsc::Sender<ParleyError>,
) {
    loop {
        if *stop.borrow() {
            break;
        }
        match tokio::time::timeout(defaults::QUEUE_POLL_TIMEOUT, frame_rx.recv()).await {
            Ok(Some(frame)) => {
                if let Err(e) = sender.send_audio(&frame.samples, sample_rate).await {
                    let _ = fault_tx.try_send(e);
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => continue,
        }
    }

    sender.close().await;
}

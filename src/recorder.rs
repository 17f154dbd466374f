//! Periodic bar chart acquisition.
//!
//! [`Recorder::start`] prepares the instrument on a fresh session
//! (handshake, `Control`, sensor state check, `AddBarchart`, `ScanAdd`) and
//! spawns a loop that, on every polling tick, sends `ScanResume 1` and drains
//! `MassReading` events up to the configured end mass. Each completed scan is
//! published to a [`SampleSink`] as one [`DataFrame`].
//!
//! [`Recorder::stop`] raises a cancellation flag. The loop observes it between
//! frames. A scan interrupted mid-drain is halted with `ScanStop` first, then
//! the filament is switched off and the sensor released.

use crate::config::RecordingConfig;
use crate::error::{RgaError, RgaResult};
use crate::protocol::commands::OnOff;
use crate::protocol::SensorState;
use crate::session::{MassSample, Session};
use crate::transport::RgaStream;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

/// MIME type of a serialized [`DataFrame`].
pub const CONTENT_TYPE: &str = "application/json";

/// One named reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    /// Reading label, `mass <position>`.
    pub name: String,
    /// Reading value.
    pub value: f64,
}

/// One completed scan, ready for a downstream sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataFrame {
    /// Label of the recording instrument.
    pub source: String,
    /// Always [`CONTENT_TYPE`].
    #[serde(rename = "type")]
    pub content_type: String,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// Readings in scan order.
    pub data: Vec<Payload>,
}

impl DataFrame {
    /// Builds a frame stamped with the current time. Readings are named
    /// `mass <position>`.
    pub fn from_samples(source: &str, samples: &[MassSample]) -> Self {
        Self {
            source: source.to_string(),
            content_type: CONTENT_TYPE.to_string(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            data: samples
                .iter()
                .map(|s| Payload {
                    name: format!("mass {}", s.mass_position),
                    value: s.value,
                })
                .collect(),
        }
    }

    /// Serializes the frame for publishing.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Destination for completed scans.
#[async_trait]
pub trait SampleSink: Send {
    /// Publishes one frame. An error ends the recording loop.
    async fn publish(&mut self, frame: DataFrame) -> RgaResult<()>;
}

#[async_trait]
impl SampleSink for mpsc::Sender<DataFrame> {
    async fn publish(&mut self, frame: DataFrame) -> RgaResult<()> {
        // Receiver gone: nobody consumes the data any more
        self.send(frame).await.map_err(|_| RgaError::Cancelled)
    }
}

/// Drives the recording loop on a spawned task.
#[derive(Debug)]
pub struct Recorder {
    config: RecordingConfig,
    source: String,
    settle_delay: Duration,
    recording: Arc<AtomicBool>,
    cancel: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<RgaResult<()>>>,
}

impl Recorder {
    /// `source` labels every published [`DataFrame`].
    pub fn new(config: RecordingConfig, source: impl Into<String>) -> Self {
        Self {
            config,
            source: source.into(),
            settle_delay: Duration::from_secs(1),
            recording: Arc::new(AtomicBool::new(false)),
            cancel: None,
            task: None,
        }
    }

    /// Pause between preparing the instrument and the first scan.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Whether an acquisition loop is running.
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }
    /// Prepares the instrument and spawns the acquisition loop.
    ///
    /// Fails with [`RgaError::AlreadyRecording`] while a loop is running and
    /// with [`RgaError::SensorNotReady`] when the sensor is not `InUse` after
    /// taking control.
    #[instrument(skip_all, fields(source = %self.source), err)]
    pub async fn start<S, K>(&mut self, mut session: Session<S>, sink: K) -> RgaResult<()>
    where
        S: RgaStream + 'static,
        K: SampleSink + 'static,
    {
        if self
            .recording
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RgaError::AlreadyRecording);
        }

        if let Err(err) = self.prepare(&mut session).await {
            self.recording.store(false, Ordering::Release);
            return Err(err);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let plan = ScanPlan {
            source: self.source.clone(),
            end_mass: self.config.barchart.end_mass,
            interval: self.config.polling_interval(),
            settle_delay: self.settle_delay,
        };
        let recording = Arc::clone(&self.recording);

        self.cancel = Some(cancel_tx);
        self.task = Some(tokio::spawn(async move {
            let result = acquisition_loop(&mut session, sink, cancel_rx, &plan).await;
            match &result {
                Ok(()) => info!("recording stopped"),
                Err(err) => error!(error = %err, "recording loop failed"),
            }
            match &result {
                Err(err) if err.is_connection_fatal() => {
                    warn!("connection lost, skipping filament shutdown and release");
                }
                _ => release_instrument(&mut session).await,
            }
            recording.store(false, Ordering::Release);
            result
        }));

        info!(
            interval_secs = self.config.polling_interval().as_secs(),
            "recording started"
        );
        Ok(())
    }

    /// Signals the loop to stop and waits for it to finish its cleanup.
    ///
    /// Fails with [`RgaError::AlreadyStopped`] when no loop is running.
    pub async fn stop(&mut self) -> RgaResult<()> {
        let task = self.task.take();
        if self
            .recording
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // A loop that ended on its own still needs joining
            if let Some(task) = task {
                let _ = task.await;
            }
            self.cancel = None;
            return Err(RgaError::AlreadyStopped);
        }

        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(true);
        }
        if let Some(task) = task {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "recording ended with error"),
                Err(join) => warn!(error = %join, "recording task aborted"),
            }
        }
        Ok(())
    }

    async fn prepare<S: RgaStream>(&self, session: &mut Session<S>) -> RgaResult<()> {
        session.handshake().await?;
        session
            .control(&self.config.app_name, &self.config.app_version)
            .await?;

        let state = session.sensor_state().await?;
        if state != SensorState::InUse {
            return Err(RgaError::SensorNotReady {
                state: state.to_string(),
            });
        }

        let chart = &self.config.barchart;
        session.execute(&chart.to_command()).await?;
        session.scan_add(&chart.name).await?;
        debug!(measurement = %chart.name, "measurement added to scan");
        Ok(())
    }
}

struct ScanPlan {
    source: String,
    end_mass: i64,
    interval: Duration,
    settle_delay: Duration,
}

async fn acquisition_loop<S, K>(
    session: &mut Session<S>,
    mut sink: K,
    mut cancel: watch::Receiver<bool>,
    plan: &ScanPlan,
) -> RgaResult<()>
where
    S: RgaStream,
    K: SampleSink,
{
    tokio::time::sleep(plan.settle_delay).await;

    let mut ticker = tokio::time::interval(plan.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *cancel.borrow() {
            return Ok(());
        }

        tokio::select! {
            _ = ticker.tick() => {}
            changed = cancel.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                continue;
            }
        }

        session.scan_resume(1).await?;
        let samples = match session.collect_scan(plan.end_mass, Some(&cancel)).await {
            Ok(samples) => samples,
            Err(RgaError::Cancelled) => {
                // Readings of the aborted scan may still be in flight
                session.scan_stop().await?;
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        debug!(points = samples.len(), "scan collected");

        match sink.publish(DataFrame::from_samples(&plan.source, &samples)).await {
            Ok(()) => {}
            Err(RgaError::Cancelled) => {
                info!("sink closed");
                return Ok(());
            }
            Err(err) => return Err(err),
        }
    }
}

async fn release_instrument<S: RgaStream>(session: &mut Session<S>) {
    if let Err(err) = session.filament_control(OnOff::Off).await {
        warn!(error = %err, "failed to switch filament off");
    }
    if let Err(err) = session.release().await {
        warn!(error = %err, "failed to release sensor");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::mock_stream;

    fn recorder() -> Recorder {
        Recorder::new(Settings::for_address("rga:10014").recording, "mks-rga")
            .with_settle_delay(Duration::ZERO)
    }

    #[test]
    fn data_frame_names_masses() {
        let samples = [
            MassSample {
                mass_position: 1,
                value: 1.0e-9,
            },
            MassSample {
                mass_position: 2,
                value: 2.5e-8,
            },
        ];
        let frame = DataFrame::from_samples("rga-1", &samples);
        assert_eq!(frame.data[0].name, "mass 1");
        assert_eq!(frame.data[1].value, 2.5e-8);

        let json: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "application/json");
        assert_eq!(json["source"], "rga-1");
        assert_eq!(json["data"][1]["name"], "mass 2");
    }

    #[tokio::test]
    async fn sensor_not_in_use_aborts_start() {
        let (stream, mut rga) = mock_stream::new();
        let (tx, _rx) = mpsc::channel(4);
        let mut recorder = recorder();

        let client = tokio::spawn(async move {
            let result = recorder.start(Session::new(stream), tx).await;
            (result, recorder.is_recording())
        });

        rga.expect_and_respond_frame(b"\n\r", &["MKSRGA Single"]).await;
        rga.expect_and_respond_frame(
            format!("Control mks-rga {}\n\r", env!("CARGO_PKG_VERSION")).as_bytes(),
            &["Control OK"],
        )
        .await;
        rga.expect_and_respond_frame(b"SensorState\n\r", &["SensorState OK", "State Config"])
            .await;

        let (result, recording) = client.await.unwrap();
        match result.unwrap_err() {
            RgaError::SensorNotReady { state } => assert_eq!(state, "Config"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!recording);
    }

    #[tokio::test]
    async fn stop_without_start_fails() {
        let mut recorder = recorder();
        assert!(matches!(
            recorder.stop().await.unwrap_err(),
            RgaError::AlreadyStopped
        ));
    }

    #[tokio::test]
    async fn closed_sink_reports_cancelled() {
        let (mut tx, rx) = mpsc::channel::<DataFrame>(1);
        drop(rx);
        let err = tx
            .publish(DataFrame::from_samples("rga", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, RgaError::Cancelled));
    }
}

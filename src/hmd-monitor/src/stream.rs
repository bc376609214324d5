// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Endpoint readers and the decode loop.
//!
//! Every endpoint gets its own reader task forwarding raw frames into one
//! channel. The decode loop is the only consumer: frames that are not
//! sensor reports are counted and dropped, the rest are printed.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

use hmd_core::{DecodedReport, DynResult, RawFrame, ReportSource, START_STREAM_COMMAND};
use hmd_imu::{decode_report, ReportText};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Per-endpoint frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub accepted: u64,
    pub ignored: u64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    endpoint: usize,
    #[serde(flatten)]
    report: &'a DecodedReport,
}

/// Writes decoded reports in the selected format.
///
/// Each report is formatted in memory and written as one chunk, so a slow
/// consumer of the output suspends the decode loop instead of blocking a
/// runtime thread.
pub struct ReportPrinter<W: AsyncWrite + Unpin> {
    out: W,
    format: OutputFormat,
}

impl<W: AsyncWrite + Unpin> ReportPrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self { out, format }
    }

    pub async fn print(&mut self, endpoint: usize, report: &DecodedReport) -> DynResult<()> {
        let chunk = match self.format {
            OutputFormat::Text => {
                format!("endpoint: {}\n{}\n\n", endpoint, ReportText(report)).into_bytes()
            }
            OutputFormat::Json => {
                let mut line = serde_json::to_vec(&JsonReport { endpoint, report })?;
                line.push(b'\n');
                line
            }
        };
        self.out.write_all(&chunk).await?;
        self.out.flush().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Start every endpoint and spawn one reader task per endpoint.
///
/// Readers end when their endpoint ends, on error, when the receiving side
/// is gone, or on shutdown. A failing endpoint does not affect the others.
pub fn spawn_endpoint_readers(
    sources: Vec<Box<dyn ReportSource>>,
    frame_tx: mpsc::Sender<RawFrame>,
    shutdown_rx: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    sources
        .into_iter()
        .map(|source| {
            let tx = frame_tx.clone();
            let reader_shutdown_rx = shutdown_rx.clone();
            tokio::spawn(async move {
                let endpoint = source.info().index;
                if let Err(e) = run_endpoint_reader(source, tx, reader_shutdown_rx).await {
                    error!("Endpoint {} reader error: {}", endpoint, e);
                }
            })
        })
        .collect()
}

async fn run_endpoint_reader(
    mut source: Box<dyn ReportSource>,
    frame_tx: mpsc::Sender<RawFrame>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> DynResult<()> {
    let endpoint = source.info().index;
    let address = source.info().address.clone();

    source.start(&START_STREAM_COMMAND).await?;
    debug!("Endpoint {} ({}) started", endpoint, address);

    if *shutdown_rx.borrow() {
        return Ok(());
    }

    loop {
        // `next_report` is cancel-safe, so losing the race to shutdown drops no frame.
        tokio::select! {
            report = source.next_report() => {
                match report? {
                    Some(data) => {
                        if frame_tx.send(RawFrame { endpoint, data }).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        info!("Endpoint {} ({}) ended", endpoint, address);
                        break;
                    }
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Decode frames until all endpoints end, `limit` reports were printed, or
/// shutdown is signalled. Returns the per-endpoint counters.
pub async fn run_decode_loop<W: AsyncWrite + Unpin>(
    mut frame_rx: mpsc::Receiver<RawFrame>,
    printer: &mut ReportPrinter<W>,
    limit: Option<u64>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> DynResult<BTreeMap<usize, FrameStats>> {
    let mut stats: BTreeMap<usize, FrameStats> = BTreeMap::new();
    let mut printed: u64 = 0;

    loop {
        if limit.is_some_and(|limit| printed >= limit) {
            info!("Report limit reached ({})", printed);
            break;
        }

        tokio::select! {
            frame = frame_rx.recv() => {
                let Some(frame) = frame else {
                    debug!("All endpoints closed");
                    break;
                };
                let entry = stats.entry(frame.endpoint).or_default();
                match decode_report(&frame.data) {
                    Some(report) => {
                        entry.accepted += 1;
                        printer.print(frame.endpoint, &report).await?;
                        printed += 1;
                    }
                    None => {
                        entry.ignored += 1;
                        trace!(
                            "Ignoring {}-byte frame from endpoint {}",
                            frame.data.len(),
                            frame.endpoint
                        );
                    }
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    for (endpoint, s) in &stats {
        info!(
            "Endpoint {}: {} report(s) decoded, {} frame(s) ignored",
            endpoint, s.accepted, s.ignored
        );
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::time::Duration;

    use tokio::io::AsyncReadExt;

    use hmd_transport::{register_builtin_transports_on, RegistrationContext, TransportAccess};

    fn frame(endpoint: usize, data: Vec<u8>) -> RawFrame {
        RawFrame { endpoint, data }
    }

    #[tokio::test]
    async fn decode_loop_prints_reports_and_counts_ignored() {
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tx.send(frame(0, vec![0u8; 64])).await.unwrap();
        tx.send(frame(1, vec![0u8; 16])).await.unwrap();
        tx.send(frame(1, Vec::new())).await.unwrap();
        drop(tx);

        let mut printer = ReportPrinter::new(Vec::new(), OutputFormat::Text);
        let stats = run_decode_loop(rx, &mut printer, None, shutdown_rx)
            .await
            .unwrap();

        assert_eq!(
            stats[&0],
            FrameStats {
                accepted: 1,
                ignored: 0
            }
        );
        assert_eq!(
            stats[&1],
            FrameStats {
                accepted: 0,
                ignored: 2
            }
        );

        let text = String::from_utf8(printer.into_inner()).unwrap();
        let report = decode_report(&[0u8; 64]).unwrap();
        assert_eq!(
            text,
            format!("endpoint: 0\n{}\n\n", hmd_imu::render(&report))
        );
    }

    #[tokio::test]
    async fn decode_loop_stops_at_limit() {
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        for seq in 0..5 {
            tx.send(frame(0, hmd_transport::synthetic_report(seq).to_vec()))
                .await
                .unwrap();
        }

        let mut printer = ReportPrinter::new(Vec::new(), OutputFormat::Text);
        let stats = run_decode_loop(rx, &mut printer, Some(2), shutdown_rx)
            .await
            .unwrap();
        assert_eq!(stats[&0].accepted, 2);

        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(text.matches("endpoint: 0").count(), 2);
        drop(tx);
    }

    #[tokio::test]
    async fn decode_loop_stops_on_shutdown() {
        let (_tx, rx) = mpsc::channel::<RawFrame>(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        shutdown_tx.send(true).unwrap();

        let mut printer = ReportPrinter::new(Vec::new(), OutputFormat::Text);
        let stats = tokio::time::timeout(
            Duration::from_secs(5),
            run_decode_loop(rx, &mut printer, None, shutdown_rx),
        )
        .await
        .expect("loop should stop")
        .unwrap();
        assert!(stats.is_empty());
        assert!(printer.into_inner().is_empty());
    }

    #[tokio::test]
    async fn json_output_is_one_object_per_line() {
        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tx.send(frame(3, vec![0u8; 64])).await.unwrap();
        tx.send(frame(3, hmd_transport::synthetic_report(0).to_vec()))
            .await
            .unwrap();
        drop(tx);

        let mut printer = ReportPrinter::new(Vec::new(), OutputFormat::Json);
        run_decode_loop(rx, &mut printer, None, shutdown_rx)
            .await
            .unwrap();

        let text = String::from_utf8(printer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let zero: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(zero["endpoint"], 3);
        assert_eq!(zero["signature"], "00 00");
        assert!(zero["angular_velocity"]["vector"]["x"].is_null());

        let synthetic: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(synthetic["acceleration"]["vector"]["z"], 1.0);
    }

    #[tokio::test]
    async fn printer_waits_for_a_slow_reader() {
        let (writer, mut reader) = tokio::io::duplex(32);
        let report = decode_report(&[0u8; 64]).unwrap();
        let expected = format!("endpoint: 0\n{}\n\n", hmd_imu::render(&report));
        let mut printer = ReportPrinter::new(writer, OutputFormat::Text);

        let mut text = String::new();
        let (printed, read) = tokio::join!(
            async move {
                let result = printer.print(0, &report).await;
                drop(printer);
                result
            },
            reader.read_to_string(&mut text)
        );
        printed.unwrap();
        read.unwrap();
        assert_eq!(text, expected);
    }

    #[test]
    fn output_format_names() {
        assert_eq!(OutputFormat::from_name("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_name("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_name("csv"), None);
    }

    #[tokio::test]
    async fn readers_forward_every_endpoint_until_replay_ends() {
        let mut capture = tempfile::NamedTempFile::new().unwrap();
        writeln!(capture, "{}", vec!["00"; 64].join(" ")).unwrap();
        writeln!(capture, "@1 01 02 03").unwrap();
        writeln!(capture, "@1 04").unwrap();

        let mut registry = RegistrationContext::new();
        register_builtin_transports_on(&mut registry);
        let sources = registry
            .build_sources(
                "replay",
                TransportAccess::Replay {
                    path: capture.path().to_path_buf(),
                    interval: Duration::ZERO,
                },
            )
            .unwrap();

        let (tx, rx) = mpsc::channel(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = spawn_endpoint_readers(sources, tx, shutdown_rx.clone());

        let mut printer = ReportPrinter::new(Vec::new(), OutputFormat::Text);
        let stats = run_decode_loop(rx, &mut printer, None, shutdown_rx)
            .await
            .unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(stats[&0].accepted, 1);
        assert_eq!(stats[&1].ignored, 2);
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert!(text.starts_with("endpoint: 0\nsignature: 00 00\n"));
    }
}

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use anyhow::{Context, bail};
use common::models::Signal;
use poller::{AlertEffect, Notifier};
use tokio::runtime::Handle;
use tracing::debug;

const BELL: &[u8] = b"\x07";
const BEEP_GAP: Duration = Duration::from_millis(250);

/// Rings the terminal bell. Fails up front when there is no controlling terminal.
pub struct TerminalBell {
    tty: PathBuf,
    beeps: u32,
}

impl TerminalBell {
    pub fn new(beeps: u32) -> Self {
        Self::with_device("/dev/tty", beeps)
    }

    pub fn with_device(tty: impl Into<PathBuf>, beeps: u32) -> Self {
        Self {
            tty: tty.into(),
            beeps,
        }
    }
}

impl AlertEffect for TerminalBell {
    fn name(&self) -> &'static str {
        "terminal bell"
    }

    fn fire(&self, _signal: &Signal) -> anyhow::Result<()> {
        if self.beeps == 0 {
            bail!("bell disabled");
        }

        let mut tty = OpenOptions::new()
            .write(true)
            .open(&self.tty)
            .with_context(|| format!("Failed to open {}", self.tty.display()))?;

        tty.write_all(BELL).context("Failed to ring bell")?;
        tty.flush().ok();

        let remaining = self.beeps - 1;
        if remaining > 0 {
            // Remaining beeps go out on their own thread.
            thread::spawn(move || {
                for _ in 0..remaining {
                    thread::sleep(BEEP_GAP);
                    if tty.write_all(BELL).and_then(|_| tty.flush()).is_err() {
                        debug!("terminal went away mid-alert");
                        break;
                    }
                }
            });
        }

        Ok(())
    }
}

/// Writes a highlighted banner to a sink, stderr by default.
pub struct ConsoleAlert {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleAlert {
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(io::stderr()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn banner(signal: &Signal) -> String {
        let headline = signal.headline();
        let rule = "=".repeat(headline.len() + 12);
        format!("{rule}\n  SIGNAL  {headline}\n{rule}\n")
    }
}

impl AlertEffect for ConsoleAlert {
    fn name(&self) -> &'static str {
        "console banner"
    }

    fn fire(&self, signal: &Signal) -> anyhow::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("console writer poisoned"))?;

        out.write_all(Self::banner(signal).as_bytes())
            .context("Failed to write alert banner")?;
        out.flush().context("Failed to flush alert banner")?;
        Ok(())
    }
}

/// Hands each notification to tokio's blocking pool, so terminal I/O never
/// stalls a runtime worker. Runs inline when called outside a runtime.
pub struct OffloadedNotifier {
    inner: Arc<dyn Notifier>,
}

impl OffloadedNotifier {
    pub fn new(inner: Arc<dyn Notifier>) -> Self {
        Self { inner }
    }
}

impl Notifier for OffloadedNotifier {
    fn notify(&self, signal: &Signal) {
        let Ok(runtime) = Handle::try_current() else {
            self.inner.notify(signal);
            return;
        };

        let inner = Arc::clone(&self.inner);
        let signal = signal.clone();
        runtime.spawn_blocking(move || inner.notify(&signal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{Side, SignalId};
    use poller::FallbackNotifier;
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn buy() -> Signal {
        Signal {
            id: Some(SignalId::Number(1)),
            symbol: Some("BTCUSDT".to_string()),
            side: Some(Side::Buy),
            entry: Some(65000.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_banner_contains_headline() {
        let banner = ConsoleAlert::banner(&buy());
        assert!(banner.contains("SIGNAL  BUY BTCUSDT @ 65000.00"));
        assert!(banner.starts_with("===="));
    }

    #[test]
    fn test_missing_tty_falls_back_to_banner() {
        let buf = SharedBuf::default();
        let notifier = FallbackNotifier::new(
            TerminalBell::with_device("/nonexistent/tty", 2),
            ConsoleAlert::with_writer(Box::new(buf.clone())),
        );

        notifier.notify(&buy());

        assert!(buf.text().contains("BUY BTCUSDT"));
    }

    #[test]
    fn test_bell_writes_to_device() {
        let path = std::env::temp_dir().join(format!("bell-{}", std::process::id()));
        std::fs::write(&path, b"").unwrap();

        TerminalBell::with_device(&path, 1).fire(&buy()).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), BELL);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_disabled_bell_is_a_failure() {
        assert!(TerminalBell::with_device("/dev/null", 0).fire(&buy()).is_err());
    }

    struct Recorder(mpsc::UnboundedSender<Option<SignalId>>);

    impl Notifier for Recorder {
        fn notify(&self, signal: &Signal) {
            self.0.send(signal.id.clone()).ok();
        }
    }

    #[tokio::test]
    async fn test_offloaded_notifier_delivers_from_blocking_pool() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let notifier = OffloadedNotifier::new(Arc::new(Recorder(tx)));

        notifier.notify(&buy());

        assert_eq!(rx.recv().await, Some(Some(SignalId::Number(1))));
    }

    #[test]
    fn test_offloaded_notifier_runs_inline_without_runtime() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        OffloadedNotifier::new(Arc::new(Recorder(tx))).notify(&buy());

        assert_eq!(rx.try_recv().unwrap(), Some(SignalId::Number(1)));
    }
}

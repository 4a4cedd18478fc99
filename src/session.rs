use std::time::Duration;

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{error, info, trace, warn};

use crate::{
    error::Error,
    pattern::{Inject, PERIOD},
    report::Reporter,
    transmit::Transmitter,
    verify::{DesyncPolicy, Step, Verifier},
};

/// How often throughput is reported.
const TICK: Duration = Duration::from_secs(1);

/// What a session should do, and how.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Put the pattern on the wire.
    pub transmit: bool,

    /// Verify the pattern coming off the wire.
    pub receive: bool,

    /// Keep testing after an unresolvable desync instead of exiting.
    pub restart: bool,

    /// Deliberate fault baked into the transmitted pattern.
    pub inject: Option<Inject>,
}

/// What a session has to show for itself once the link closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Cumulative bytes put on the wire.
    pub sent: u64,

    /// Cumulative bytes examined by the verifier.
    pub received: u64,
}

/// One link under test: counters, verifier state and the readiness loop
/// driving them.
///
/// The session is the only component touching the link; the transmitter,
/// verifier and reporter are pure state machines it feeds.
#[derive(Debug)]
pub struct Session {
    transmitter: Transmitter,
    verifier: Verifier,
    reporter: Reporter,
    transmit_on: bool,
    receive_on: bool,
}

impl Session {
    /// A fresh session; nothing sent, verifier priming.
    pub fn new(options: Options) -> Self {
        let policy = if options.restart {
            DesyncPolicy::Restart
        } else {
            DesyncPolicy::Strict
        };

        Self {
            transmitter: Transmitter::new(options.inject),
            verifier: Verifier::new(policy),
            reporter: Reporter::new(),
            transmit_on: options.transmit,
            receive_on: options.receive,
        }
    }

    /// Drive the link until it closes, fails, or an unresolvable desync
    /// ends the test.
    ///
    /// Everything runs on the current task: the loop blocks only while
    /// waiting for read readiness, write readiness or the reporting
    /// tick, and each wakeup is serviced to completion before the next
    /// wait.
    pub async fn run<S>(mut self, link: S) -> Result<Summary, Error>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut rx, mut tx) = tokio::io::split(link);

        let mut tick = time::interval_at(Instant::now() + TICK, TICK);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut read_buf = [0u8; 4096];
        let mut write_buf = [0u8; PERIOD];

        while self.transmit_on || self.receive_on {
            let staged = self.transmitter.fill(&mut write_buf);

            tokio::select! {
                read = rx.read(&mut read_buf), if self.receive_on => {
                    let count = read?;

                    if count == 0 {
                        info!("Link closed");
                        break;
                    }

                    self.consume(&read_buf[..count])?;
                }
                written = tx.write(&write_buf[..staged]), if self.transmit_on => {
                    // Partial acceptance is fine; the cursor only moves
                    // past what the link took.
                    self.transmitter.advance(written?);
                }
                _ = tick.tick() => {
                    let report = self
                        .reporter
                        .tick(self.transmitter.sent(), self.verifier.received());

                    info!("{report}");
                }
            }
        }

        Ok(Summary {
            sent: self.transmitter.sent(),
            received: self.verifier.received(),
        })
    }

    /// Feed everything this wakeup delivered through the verifier.
    fn consume(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            trace!("Rx: {byte:#04x}");

            match self.verifier.push(byte) {
                Step::Ok => {}
                Step::SyncLost { read, expected } => {
                    warn!("Sync lost: read {read:#04x}, expected {expected:#04x}");
                }
                Step::Resynced(anomaly) => {
                    warn!("Resynced: sync break was caused by {anomaly}");
                }
                Step::Restarted { history } => {
                    error!(
                        "Unable to resync: read {:#04x}, previous {:#04x}, before that {:#04x}",
                        history[0], history[1], history[2]
                    );
                    info!("Restarting");

                    self.reporter.clear_rx();
                }
                Step::Desynced { history } => {
                    return Err(Error::Desync {
                        read: history[0],
                        prev: history[1],
                        prev2: history[2],
                    });
                }
            }
        }

        Ok(())
    }
}

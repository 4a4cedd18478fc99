use std::fmt::Display;

/// Integer division rounding half away from zero.
///
/// Plain integer division truncates, which under-reports rates by up to
/// a whole unit. This variant is exact for both signs of `n`; `d` must
/// be positive.
pub fn div_round(n: i64, d: i64) -> i64 {
    if n >= 0 {
        (2 * n + d) / (2 * d)
    } else {
        (2 * n - d) / (2 * d)
    }
}

/// One tick's worth of throughput numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Cumulative bytes put on the wire.
    pub sent: u64,

    /// Transmit rate over the last tick, in kB/s.
    pub tx_rate: i64,

    /// Cumulative bytes examined by the verifier.
    pub received: u64,

    /// Receive rate over the last tick, in kB/s.
    pub rx_rate: i64,
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tx: {} bytes ({} kB/s), Rx: {} bytes ({} kB/s)",
            self.sent, self.tx_rate, self.received, self.rx_rate
        )
    }
}

/// Derives per-tick rates from the cumulative byte counters.
///
/// Keeps the previous tick's snapshot of each counter; the snapshot is
/// replaced, not accumulated, on every tick.
#[derive(Debug, Default)]
pub struct Reporter {
    tx_snapshot: u64,
    rx_snapshot: u64,
}

impl Reporter {
    /// A reporter with empty snapshots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per timer tick with the current cumulative counters.
    pub fn tick(&mut self, sent: u64, received: u64) -> Report {
        let tx_delta = sent - self.tx_snapshot;
        let rx_delta = received - self.rx_snapshot;

        self.tx_snapshot = sent;
        self.rx_snapshot = received;

        Report {
            sent,
            tx_rate: div_round(tx_delta as i64, 1024),
            received,
            rx_rate: div_round(rx_delta as i64, 1024),
        }
    }

    /// Forget the receive snapshot.
    ///
    /// Goes together with the verifier clearing its receive count after
    /// an unresolvable desync, so the next tick's delta stays sane.
    pub fn clear_rx(&mut self) {
        self.rx_snapshot = 0;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(div_round(2048, 1024), 2);
        assert_eq!(div_round(1536, 1024), 2);
        assert_eq!(div_round(1535, 1024), 1);
        assert_eq!(div_round(511, 1024), 0);
        assert_eq!(div_round(512, 1024), 1);
        assert_eq!(div_round(0, 1024), 0);

        assert_eq!(div_round(-1536, 1024), -2);
        assert_eq!(div_round(-511, 1024), 0);
    }

    #[test]
    fn deltas_are_relative_to_the_previous_tick() {
        let mut reporter = Reporter::new();

        let report = reporter.tick(2048, 1536);
        assert_eq!(report.tx_rate, 2);
        assert_eq!(report.rx_rate, 2);

        // Nothing moved since.
        let report = reporter.tick(2048, 1536);
        assert_eq!(report.tx_rate, 0);
        assert_eq!(report.rx_rate, 0);
        assert_eq!(report.sent, 2048);
        assert_eq!(report.received, 1536);

        let report = reporter.tick(2048 + 3072, 1536);
        assert_eq!(report.tx_rate, 3);
    }

    #[test]
    fn report_line_format() {
        let mut reporter = Reporter::new();

        let report = reporter.tick(2048, 1536);

        assert_eq!(
            report.to_string(),
            "Tx: 2048 bytes (2 kB/s), Rx: 1536 bytes (2 kB/s)"
        );
    }

    #[test]
    fn clearing_rx_follows_a_counter_reset() {
        let mut reporter = Reporter::new();

        reporter.tick(0, 5000);

        // The verifier restarted: its count went back to zero.
        reporter.clear_rx();

        let report = reporter.tick(0, 1024);
        assert_eq!(report.rx_rate, 1);
        assert_eq!(report.received, 1024);
    }
}

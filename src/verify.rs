use std::fmt::Display;

use tracing::debug;

/// How many bytes of history the verifier keeps.
///
/// Three bytes are exactly enough to tell a single inserted, corrupted
/// or dropped byte apart: the three diagnoses test disjoint offsets
/// (+1, +2, +3) from the last byte that still made sense.
const HISTORY: usize = 3;

/// What to do when a sync break cannot be explained by a single
/// inserted, corrupted or dropped byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesyncPolicy {
    /// Give up: the verifier reports a fatal desync.
    Strict,

    /// Keep testing: re-prime the verifier and clear its receive count.
    Restart,
}

/// A single-event stream anomaly, diagnosed from three bytes of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// A spurious byte was injected into the stream.
    Inserted(u8),

    /// A byte had its value altered, but the stream neither gained nor
    /// lost a byte.
    Corrupted(u8),

    /// A byte was dropped from the stream.
    Missing(u8),
}

impl Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::Inserted(byte) => write!(f, "inserted {byte:#04x}"),
            Anomaly::Corrupted(byte) => write!(f, "corrupted {byte:#04x}"),
            Anomaly::Missing(byte) => write!(f, "missing {byte:#04x}"),
        }
    }
}

/// Diagnose a sync break from the three most recent bytes.
///
/// `b1` is the byte that broke the successor invariant, `b2` the byte
/// before it, and `b0` the byte that arrived after the break.
/// Returns the single-event anomaly that explains the break, or `None`
/// when no single insertion, corruption or omission can.
///
/// The three checks are mutually exclusive: they test disjoint offsets
/// from `b2`. The order is fixed only so diagnoses are deterministic.
pub fn classify(b0: u8, b1: u8, b2: u8) -> Option<Anomaly> {
    if b0 == b2.wrapping_add(1) {
        // b1 was never part of the pattern; the counter carried on
        // around it.
        Some(Anomaly::Inserted(b1))
    } else if b0 == b2.wrapping_add(2) {
        // b1 sat where the counter expected a byte, but with the wrong
        // value.
        Some(Anomaly::Corrupted(b1))
    } else if b0 == b1.wrapping_add(1) && b0 == b2.wrapping_add(3) {
        // The counter is consistent again but one step ahead: exactly
        // one byte fell out between b2 and b1.
        Some(Anomaly::Missing(b1.wrapping_sub(1)))
    } else {
        None
    }
}

/// A progress note is logged every 16 KiB received.
fn milestone(received: u64) -> bool {
    received & 0x3FFF == 0
}

/// The outcome of feeding one byte to the [`Verifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The byte was consumed: either it obeyed the successor invariant,
    /// or the verifier is still priming its history.
    Ok,

    /// The successor invariant broke at this byte.
    /// The next byte will be used for diagnosis.
    SyncLost {
        /// The byte that arrived.
        read: u8,

        /// The byte the pattern called for.
        expected: u8,
    },

    /// The break was explained and the stream is synchronized again.
    Resynced(Anomaly),

    /// The break could not be explained; the verifier re-primed itself
    /// and cleared its receive count ([`DesyncPolicy::Restart`]).
    Restarted {
        /// The three most recent bytes, newest first.
        history: [u8; HISTORY],
    },

    /// The break could not be explained and the policy is
    /// [`DesyncPolicy::Strict`]: the stream should be torn down.
    Desynced {
        /// The three most recent bytes, newest first.
        history: [u8; HISTORY],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Fewer than three bytes seen since the stream (re)started.
    Priming,

    /// Steady state: each byte must equal its predecessor plus one.
    Synced,

    /// One byte arrived after a sync break; the next byte decides the
    /// diagnosis.
    Resyncing,
}

/// Validates a received byte stream against the counter pattern and
/// recovers from single-event anomalies.
///
/// One instance per receive stream. The verifier never touches the link
/// itself; the session feeds it bytes and acts on the returned [`Step`]s.
#[derive(Debug)]
pub struct Verifier {
    state: State,
    /// The most recent bytes, newest first: `history[0]` is the current
    /// byte, `history[1]` the previous, `history[2]` the one before that.
    history: [u8; HISTORY],
    received: u64,
    policy: DesyncPolicy,
}

impl Verifier {
    /// A fresh verifier in the priming state.
    pub fn new(policy: DesyncPolicy) -> Self {
        Self {
            state: State::Priming,
            history: [0; HISTORY],
            received: 0,
            policy,
        }
    }

    /// Cumulative number of bytes examined.
    /// Counts every byte fed in, validated or not.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Feed one received byte through the state machine.
    pub fn push(&mut self, byte: u8) -> Step {
        self.history[0] = byte;
        self.received += 1;

        if self.received == 1 {
            debug!("Receiving");
        } else if milestone(self.received) {
            debug!("{} bytes", self.received);
        }

        let step = match self.state {
            State::Priming => {
                if self.received < HISTORY as u64 {
                    Step::Ok
                } else {
                    debug!("Verifying");
                    self.state = State::Synced;
                    self.check_successor()
                }
            }
            State::Synced => self.check_successor(),
            State::Resyncing => self.diagnose(),
        };

        // The history always holds the three most recent raw bytes, no
        // matter which branch the byte took.
        self.history[2] = self.history[1];
        self.history[1] = self.history[0];

        step
    }

    fn check_successor(&mut self) -> Step {
        let expected = self.history[1].wrapping_add(1);

        if self.history[0] == expected {
            Step::Ok
        } else {
            self.state = State::Resyncing;
            Step::SyncLost {
                read: self.history[0],
                expected,
            }
        }
    }

    fn diagnose(&mut self) -> Step {
        let [b0, b1, b2] = self.history;

        match classify(b0, b1, b2) {
            Some(anomaly) => {
                self.state = State::Synced;
                Step::Resynced(anomaly)
            }
            None => {
                let history = self.history;

                match self.policy {
                    DesyncPolicy::Restart => {
                        self.state = State::Priming;
                        self.received = 0;
                        Step::Restarted { history }
                    }
                    DesyncPolicy::Strict => Step::Desynced { history },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn feed(verifier: &mut Verifier, bytes: &[u8]) -> Vec<Step> {
        bytes.iter().map(|byte| verifier.push(*byte)).collect()
    }

    #[test]
    fn first_two_bytes_are_never_validated() {
        let mut verifier = Verifier::new(DesyncPolicy::Strict);

        // Wildly non-consecutive, yet fine: priming.
        assert_eq!(verifier.push(0xAA), Step::Ok);
        assert_eq!(verifier.push(0x17), Step::Ok);
    }

    #[test]
    fn third_byte_is_validated() {
        let mut verifier = Verifier::new(DesyncPolicy::Strict);

        assert_eq!(
            feed(&mut verifier, &[0x05, 0x06, 0x07]),
            vec![Step::Ok, Step::Ok, Step::Ok]
        );

        let mut verifier = Verifier::new(DesyncPolicy::Strict);
        feed(&mut verifier, &[0x05, 0x06]);

        assert_eq!(
            verifier.push(0x99),
            Step::SyncLost {
                read: 0x99,
                expected: 0x07
            }
        );
    }

    #[test]
    fn clean_stream_stays_synced() {
        let mut verifier = Verifier::new(DesyncPolicy::Strict);

        for offset in 0..1024u64 {
            assert_eq!(verifier.push(crate::pattern::byte_at(offset + 77)), Step::Ok);
        }

        assert_eq!(verifier.received(), 1024);
    }

    #[test]
    fn wraparound_is_not_a_break() {
        let mut verifier = Verifier::new(DesyncPolicy::Strict);

        assert_eq!(
            feed(&mut verifier, &[0xFD, 0xFE, 0xFF, 0x00, 0x01]),
            vec![Step::Ok; 5]
        );
    }

    #[test]
    fn corrupted_byte_is_diagnosed() {
        let mut verifier = Verifier::new(DesyncPolicy::Strict);

        let steps = feed(&mut verifier, &[0x4D, 0x4E, 0x4F, 0x50, 0xAF, 0x52, 0x53]);

        assert_eq!(
            steps,
            vec![
                Step::Ok,
                Step::Ok,
                Step::Ok,
                Step::Ok,
                Step::SyncLost {
                    read: 0xAF,
                    expected: 0x51
                },
                Step::Resynced(Anomaly::Corrupted(0xAF)),
                Step::Ok,
            ]
        );

        // Every byte examined is counted, including the corrupted one.
        assert_eq!(verifier.received(), 7);
    }

    #[test]
    fn inserted_byte_is_diagnosed() {
        let mut verifier = Verifier::new(DesyncPolicy::Strict);

        let steps = feed(&mut verifier, &[0x4E, 0x4F, 0x50, 0x99, 0x51, 0x52]);

        assert_eq!(
            steps,
            vec![
                Step::Ok,
                Step::Ok,
                Step::Ok,
                Step::SyncLost {
                    read: 0x99,
                    expected: 0x51
                },
                Step::Resynced(Anomaly::Inserted(0x99)),
                Step::Ok,
            ]
        );
    }

    #[test]
    fn missing_byte_is_diagnosed() {
        let mut verifier = Verifier::new(DesyncPolicy::Strict);

        let steps = feed(&mut verifier, &[0x4D, 0x4E, 0x4F, 0x51, 0x52, 0x53]);

        assert_eq!(
            steps,
            vec![
                Step::Ok,
                Step::Ok,
                Step::Ok,
                Step::SyncLost {
                    read: 0x51,
                    expected: 0x50
                },
                Step::Resynced(Anomaly::Missing(0x50)),
                Step::Ok,
            ]
        );
    }

    #[test]
    fn unexplainable_break_is_fatal_in_strict_mode() {
        let mut verifier = Verifier::new(DesyncPolicy::Strict);

        let steps = feed(&mut verifier, &[0x10, 0x11, 0x12, 0x80, 0x30]);

        assert_eq!(
            steps.last(),
            Some(&Step::Desynced {
                history: [0x30, 0x80, 0x12]
            })
        );
    }

    #[test]
    fn restart_policy_reprimes_and_clears_the_count() {
        let mut verifier = Verifier::new(DesyncPolicy::Restart);

        let steps = feed(&mut verifier, &[0x10, 0x11, 0x12, 0x80, 0x30]);

        assert_eq!(
            steps.last(),
            Some(&Step::Restarted {
                history: [0x30, 0x80, 0x12]
            })
        );
        assert_eq!(verifier.received(), 0);

        // Back in priming: two free bytes, then validation resumes.
        assert_eq!(
            feed(&mut verifier, &[0x20, 0x21, 0x22]),
            vec![Step::Ok, Step::Ok, Step::Ok]
        );
        assert_eq!(verifier.received(), 3);
    }

    #[test]
    fn progress_milestones_every_16k() {
        assert!(milestone(16_384));
        assert!(milestone(32_768));

        assert!(!milestone(1));
        assert!(!milestone(16_383));
        assert!(!milestone(16_385));
    }

    #[test]
    fn classification_handles_wraparound() {
        assert_eq!(classify(0x00, 0xAB, 0xFF), Some(Anomaly::Inserted(0xAB)));
        assert_eq!(classify(0x01, 0xAB, 0xFF), Some(Anomaly::Corrupted(0xAB)));
        assert_eq!(classify(0x02, 0x01, 0xFF), Some(Anomaly::Missing(0x00)));
    }

    #[test]
    fn classification_offsets_are_disjoint() {
        // Any single-event anomaly lands on exactly one of the three
        // offsets from b2; everything else is unresolvable.
        assert_eq!(classify(0x55, 0x99, 0x50), None);
        assert_eq!(classify(0x50, 0x99, 0x50), None);

        // +1 from b1 alone is not enough for a missing-byte diagnosis.
        assert_eq!(classify(0x9A, 0x99, 0x50), None);
    }
}

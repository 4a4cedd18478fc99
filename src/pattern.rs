use clap::ValueEnum;

/// The pattern repeats every 256 bytes.
pub const PERIOD: usize = 256;

/// The slot a deliberate fault is injected into, once per period.
const FAULT_SLOT: u8 = 0x51;

/// The reference byte at the given offset into the unbounded pattern
/// value space.
///
/// The pattern is simply a wrapping counter: `byte_at(n)` is `n mod 256`.
/// This makes the stream self-describing, since every byte equals its
/// predecessor plus one (modulo 256), which is exactly the rule the
/// receive verifier checks.
pub fn byte_at(offset: u64) -> u8 {
    (offset % PERIOD as u64) as u8
}

/// A deliberate fault baked into the transmit table, once per period.
///
/// Useful for exercising the receive verifier over a loopback cable
/// without unreliable hardware at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Inject {
    /// One byte per period has its value altered (bit-inverted).
    Corrupted,

    /// One byte per period is left out; later values shift up.
    Missing,

    /// One spurious byte per period; later values shift down.
    Inserted,
}

/// Build the 256-byte transmit table, optionally perturbed by a fault.
///
/// Without injection the table is the identity: `table[i] == i`.
pub fn table(inject: Option<Inject>) -> [u8; PERIOD] {
    let mut table = [0u8; PERIOD];

    for (index, slot) in table.iter_mut().enumerate() {
        let value = index as u8;

        *slot = match inject {
            Some(Inject::Corrupted) if value == FAULT_SLOT => !value,
            Some(Inject::Missing) if value >= FAULT_SLOT => value.wrapping_add(1),
            Some(Inject::Inserted) if value == FAULT_SLOT => !value,
            Some(Inject::Inserted) if value > FAULT_SLOT => value.wrapping_sub(1),
            _ => value,
        };
    }

    table
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn periodic() {
        for n in [0u64, 1, 17, 255, 256, 1000, 65_535, u32::MAX as u64] {
            assert_eq!(byte_at(n), byte_at(n + 256));
        }
    }

    #[test]
    fn successor() {
        for n in 0..600u64 {
            assert_eq!(byte_at(n + 1), byte_at(n).wrapping_add(1));
        }
    }

    #[test]
    fn clean_table_is_identity() {
        let table = table(None);

        for (index, value) in table.iter().enumerate() {
            assert_eq!(*value, index as u8);
        }
    }

    #[test]
    fn corrupted_table_alters_one_value() {
        let table = table(Some(Inject::Corrupted));

        assert_eq!(table[0x50], 0x50);
        assert_eq!(table[0x51], 0xAE);
        assert_eq!(table[0x52], 0x52);
    }

    #[test]
    fn missing_table_skips_one_value() {
        let table = table(Some(Inject::Missing));

        assert_eq!(table[0x50], 0x50);

        // 0x51 never appears
        assert_eq!(table[0x51], 0x52);
        assert_eq!(table[0x52], 0x53);
    }

    #[test]
    fn inserted_table_adds_one_value() {
        let table = table(Some(Inject::Inserted));

        assert_eq!(table[0x50], 0x50);

        // A spurious byte, then the counter carries on where it left off.
        assert_eq!(table[0x51], 0xAE);
        assert_eq!(table[0x52], 0x51);
        assert_eq!(table[0x53], 0x52);
    }
}

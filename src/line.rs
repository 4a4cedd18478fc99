use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, warn};

use crate::{config::Config, error::Error, report::div_round};

/// Rates a UART can be asked for directly, without a custom divisor.
const STANDARD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19_200, 38_400, 57_600,
    115_200, 230_400, 460_800, 500_000, 576_000, 921_600, 1_000_000, 1_152_000, 1_500_000,
    2_000_000, 2_500_000, 3_000_000, 3_500_000, 4_000_000,
];

/// The reference clock a divisor divides down from.
/// 16550-style: a 1.8432 MHz crystal behind a fixed /16 prescaler.
pub const BAUD_BASE: u32 = 115_200;

/// How a requested bit rate maps onto the line hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpeed {
    /// The request matches a standard rate and is used as-is.
    Standard(u32),

    /// No standard rate matches; the base clock is divided down instead.
    Custom {
        /// The clock divisor, never below 1.
        divisor: u32,

        /// The rate the divisor actually yields.
        actual: u32,
    },
}

impl LineSpeed {
    /// The bit rate the line will actually run at.
    pub fn rate(&self) -> u32 {
        match self {
            LineSpeed::Standard(rate) => *rate,
            LineSpeed::Custom { actual, .. } => *actual,
        }
    }
}

/// Resolve a requested bit rate against the given base clock.
///
/// Standard rates pass through untouched. Anything else becomes a
/// divisor of `round(base / requested)`, clamped to at least 1, and the
/// achieved rate may differ from the request due to rounding.
///
/// A rate of zero is a configuration error, not a divisor.
pub fn resolve(requested: u32, baud_base: u32) -> Result<LineSpeed, Error> {
    if requested == 0 {
        return Err(Error::BadRate(requested));
    }

    if STANDARD_RATES.contains(&requested) {
        return Ok(LineSpeed::Standard(requested));
    }

    let divisor = div_round(baud_base as i64, requested as i64).max(1) as u32;
    let actual = div_round(baud_base as i64, divisor as i64) as u32;

    Ok(LineSpeed::Custom { divisor, actual })
}

/// Open the configured serial device, 8N1 at the resolved line speed.
pub fn open(config: &Config) -> Result<SerialStream, Error> {
    let speed = resolve(config.bit_rate, BAUD_BASE)?;

    debug!(path = %config.port, rate = speed.rate(), "Opening port");

    if let LineSpeed::Custom { divisor, actual } = speed {
        if actual != config.bit_rate {
            warn!(
                "{} is not a standard rate; divisor {divisor} gives an actual rate of {actual}",
                config.bit_rate
            );
        }
    }

    let flow_control = if config.flow_control {
        tokio_serial::FlowControl::Hardware
    } else {
        tokio_serial::FlowControl::None
    };

    tokio_serial::new(&config.port, speed.rate())
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(flow_control)
        .open_native_async()
        .map_err(|source| Error::OpenPort {
            path: config.port.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn standard_rates_pass_through() {
        assert_eq!(
            resolve(115_200, BAUD_BASE).unwrap(),
            LineSpeed::Standard(115_200)
        );
        assert_eq!(resolve(9600, BAUD_BASE).unwrap(), LineSpeed::Standard(9600));
    }

    #[test]
    fn odd_rates_get_a_rounded_divisor() {
        // 115200 / 31250 = 3.6864, so the divisor rounds to 4 and the
        // line actually runs at 28800.
        assert_eq!(
            resolve(31_250, BAUD_BASE).unwrap(),
            LineSpeed::Custom {
                divisor: 4,
                actual: 28_800
            }
        );
    }

    #[test]
    fn exact_divisors_hit_the_requested_rate() {
        assert_eq!(
            resolve(28_800, BAUD_BASE).unwrap(),
            LineSpeed::Custom {
                divisor: 4,
                actual: 28_800
            }
        );
    }

    #[test]
    fn divisor_never_goes_below_one() {
        let speed = resolve(10_000_000, BAUD_BASE).unwrap();

        assert_eq!(
            speed,
            LineSpeed::Custom {
                divisor: 1,
                actual: BAUD_BASE
            }
        );
        assert_eq!(speed.rate(), BAUD_BASE);
    }

    #[test]
    fn zero_rate_is_an_error_not_a_divisor() {
        let err = resolve(0, BAUD_BASE).unwrap_err();

        assert!(matches!(err, Error::BadRate(0)));
    }
}

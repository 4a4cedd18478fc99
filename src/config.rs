use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{cli::Cli, error::Error};

fn default_port() -> String {
    if cfg!(windows) {
        "COM1".into()
    } else {
        "/dev/ttyUSB0".into()
    }
}

/// Settings for the link under test.
///
/// Loadable from a RON file; any command line flag overrides the value
/// from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The bit rate to run the line at.
    pub bit_rate: u32,

    /// The serial device to open.
    /// Likely "/dev/ttyUSBx" or "COMx".
    pub port: String,

    /// Use hardware (RTS/CTS) flow control.
    pub flow_control: bool,

    /// Keep testing after an unresolvable desync instead of exiting.
    pub restart: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bit_rate: 115_200,
            port: default_port(),
            flow_control: false,
            restart: false,
        }
    }
}

impl Config {
    fn ron() -> ron::Options {
        ron::Options::default()
    }

    /// Deserialize a .ron file's contents.
    pub fn deserialize(input: &str) -> Result<Self, ron::error::SpannedError> {
        Self::ron().from_str::<Config>(input)
    }

    /// An example configuration with some fields filled in.
    pub fn example() -> Self {
        Self {
            bit_rate: 921_600,
            port: default_port(),
            flow_control: true,
            restart: false,
        }
    }

    /// Serialize the configuration in a "pretty" (i.e. non-compact) fashion.
    pub fn serialize_pretty(&self) -> String {
        Self::ron()
            .to_string_pretty(self, ron::ser::PrettyConfig::default())
            .expect("A config is always representable as RON")
    }

    /// Setup a new configuration from a RON file.
    pub fn new_from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.into(),
            problem: e.to_string(),
        })?;

        Self::deserialize(&contents).map_err(|e| Error::Config {
            path: path.into(),
            problem: e.to_string(),
        })
    }

    /// Let explicitly given command line flags win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(bit_rate) = cli.bit_rate {
            self.bit_rate = bit_rate;
        }

        if let Some(port) = &cli.port {
            self.port = port.clone();
        }

        if cli.flow_control {
            self.flow_control = true;
        }

        if cli.restart {
            self.restart = true;
        }
    }
}

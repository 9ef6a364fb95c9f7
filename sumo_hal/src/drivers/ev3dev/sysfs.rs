//! Attribute access for ev3dev class devices.
//!
//! Every ev3dev device is a directory of text attributes under
//! `<root>/class/<class>/<name>/`. A device is identified by its `address`
//! attribute (`ev3-ports:in3`, `ev3-ports:outB`), not by its directory name,
//! which depends on plug order.

use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sumo_common::hal::driver::DriverError;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while talking to sysfs.
#[derive(Error, Debug)]
pub enum SysfsError {
    /// No device of the class reports the requested port
    #[error("No {class} device on port {port}")]
    DeviceNotFound {
        /// Device class (`lego-sensor`, `tacho-motor`)
        class: String,
        /// Requested port
        port: String,
    },

    /// Reading or writing an attribute failed
    #[error("Attribute {path}: {source}")]
    Attribute {
        /// Attribute path
        path: PathBuf,
        /// Source IO error
        source: io::Error,
    },

    /// Attribute content is not what was expected
    #[error("Cannot parse {path}: {value:?}")]
    Parse {
        /// Attribute path
        path: PathBuf,
        /// Raw content
        value: String,
    },
}

/// Result type for sysfs operations
pub type SysfsResult<T> = Result<T, SysfsError>;

impl From<SysfsError> for DriverError {
    fn from(err: SysfsError) -> Self {
        match err {
            SysfsError::DeviceNotFound { .. } => DriverError::DeviceNotFound(err.to_string()),
            SysfsError::Attribute { .. } => DriverError::Communication(err.to_string()),
            SysfsError::Parse { .. } => DriverError::InvalidReading(err.to_string()),
        }
    }
}

/// Whether an `address` attribute names `port`.
///
/// Accepts the bare port (`in3`) or the full address (`ev3-ports:in3`).
fn address_matches(address: &str, port: &str) -> bool {
    address == port
        || address
            .rsplit_once(':')
            .is_some_and(|(_, suffix)| suffix == port)
}

/// One class device directory.
#[derive(Debug, Clone)]
pub struct Device {
    path: PathBuf,
}

impl Device {
    /// Find the device of `class` plugged into `port`.
    pub fn find(root: &Path, class: &str, port: &str) -> SysfsResult<Self> {
        let class_dir = root.join("class").join(class);
        let not_found = || SysfsError::DeviceNotFound {
            class: class.to_string(),
            port: port.to_string(),
        };

        let entries = fs::read_dir(&class_dir).map_err(|e| {
            debug!("Cannot list {}: {e}", class_dir.display());
            not_found()
        })?;
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        dirs.sort();

        for dir in dirs {
            let Ok(address) = fs::read_to_string(dir.join("address")) else {
                continue;
            };
            if address_matches(address.trim(), port) {
                debug!("Port {port}: {}", dir.display());
                return Ok(Self { path: dir });
            }
        }
        Err(not_found())
    }

    /// Wrap a known device directory.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Device directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read an attribute, trimmed.
    pub fn read(&self, attribute: &str) -> SysfsResult<String> {
        let path = self.path.join(attribute);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(value.trim().to_string()),
            Err(source) => Err(SysfsError::Attribute { path, source }),
        }
    }

    /// Read an integer attribute.
    pub fn read_i64(&self, attribute: &str) -> SysfsResult<i64> {
        let value = self.read(attribute)?;
        value.parse().map_err(|_| SysfsError::Parse {
            path: self.path.join(attribute),
            value,
        })
    }

    /// Write an attribute.
    pub fn write(&self, attribute: &str, value: impl Display) -> SysfsResult<()> {
        let path = self.path.join(attribute);
        let value = value.to_string();
        trace!("{} <- {value}", path.display());
        fs::write(&path, value).map_err(|source| SysfsError::Attribute { path, source })
    }
}

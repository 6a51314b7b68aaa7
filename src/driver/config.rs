use std::path::Path;

use serde::{Deserialize, Serialize};

use super::DriverError;
use crate::compile_unit_info::DEFAULT_STACK_CAPACITY;

/// A project config file. Namely Stackc.toml
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub package: Package,
    #[serde(default)]
    pub runtime: Runtime,
}

/// Meta information about the package.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Package {
    /// The name of the package, used as the default output name.
    #[serde(default)]
    pub name: Option<String>,
    /// The SEMVER compatible version of the package.
    #[serde(default)]
    pub version: Option<String>,
}

/// Layout of the runtime value stack in the generated program.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Runtime {
    /// Size of the stack buffer in bytes.
    #[serde(default = "default_stack_capacity")]
    pub stack_capacity: usize,
    /// Whether pushes check for overflow.
    #[serde(default)]
    pub bounds_check: bool,
}

impl Default for Runtime {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            bounds_check: false,
        }
    }
}

fn default_stack_capacity() -> usize {
    DEFAULT_STACK_CAPACITY
}

impl Config {
    pub fn from_toml(source: &str) -> Result<Self, DriverError> {
        toml::from_str(source).map_err(DriverError::Config)
    }

    pub fn load(path: &Path) -> Result<Self, DriverError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }
}

//! Configuration of the stiffness operator.
use crate::kernels::FIXED_ORDERS;
use crate::metric::DEFAULT_DISTORTION_WARNING_RATIO;
use crate::shape::{ControlNodeLayout, UnsupportedControlNodeCount};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::error::Error;
use std::fmt;

/// How element contributions are accumulated into the global acceleration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScatterStrategy {
    /// Process elements one after the other on the calling thread.
    Sequential,
    /// Process the elements of each color of a graph coloring in parallel.
    Colored,
}

/// Which instantiation of the element kernels to use.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KernelSelection {
    /// Use a fixed-order instantiation if one is available for the grid size.
    Auto,
    /// Always use the runtime-sized kernels.
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Number of GLL points along `xi`.
    pub ngllx: usize,
    /// Number of GLL points along `gamma`.
    pub ngllz: usize,
    /// Number of control nodes per element, 4 or 9.
    pub ngnod: usize,
    pub scatter: ScatterStrategy,
    pub kernel: KernelSelection,
    /// Elements whose largest and smallest Jacobian differ by more than this factor are
    /// reported as strongly distorted.
    pub distortion_warning_ratio: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            ngllx: 5,
            ngllz: 5,
            ngnod: 4,
            scatter: ScatterStrategy::Colored,
            kernel: KernelSelection::Auto,
            distortion_warning_ratio: DEFAULT_DISTORTION_WARNING_RATIO,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Fewer than two GLL points in some direction.
    GridTooSmall { direction: &'static str, ngll: usize },
    UnsupportedControlNodeCount(UnsupportedControlNodeCount),
    InvalidDistortionWarningRatio(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GridTooSmall { direction, ngll } => write!(
                f,
                "Need at least 2 GLL points along {}, got {}",
                direction, ngll
            ),
            Self::UnsupportedControlNodeCount(err) => write!(f, "Invalid configuration: {}", err),
            Self::InvalidDistortionWarningRatio(ratio) => write!(
                f,
                "Distortion warning ratio must be at least 1, got {}",
                ratio
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnsupportedControlNodeCount(err) => Some(err),
            _ => None,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (direction, ngll) in [("xi", self.ngllx), ("gamma", self.ngllz)] {
            if ngll < 2 {
                return Err(ConfigError::GridTooSmall { direction, ngll });
            }
        }
        self.layout()?;
        // Also rejects NaN
        if !(self.distortion_warning_ratio >= 1.0) {
            return Err(ConfigError::InvalidDistortionWarningRatio(self.distortion_warning_ratio));
        }
        Ok(())
    }

    pub fn layout(&self) -> Result<ControlNodeLayout, ConfigError> {
        ControlNodeLayout::try_from(self.ngnod).map_err(ConfigError::UnsupportedControlNodeCount)
    }

    /// The order of the fixed-order kernel instantiation to use, if any.
    pub fn fixed_order(&self) -> Option<usize> {
        match self.kernel {
            KernelSelection::Auto if self.ngllx == self.ngllz && FIXED_ORDERS.contains(&self.ngllx) => {
                Some(self.ngllx)
            }
            _ => None,
        }
    }
}

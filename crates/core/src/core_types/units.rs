//! Semantic unit types for configuration thresholds
//!
//! Newtype wrappers keep kilometres, hectopascals and wind speeds from being
//! mixed up in the long list of tracker thresholds. Values deref to `f64` so
//! arithmetic in the numerical kernels stays plain.
//!
//! # Usage
//! ```
//! use stormtrack_core::core_types::units::{Hectopascals, Kilometers};
//!
//! let radius = Kilometers::new(650.0);
//! assert_eq!(*radius * 0.45, 292.5);
//! assert!(Hectopascals::new(1010.0) < Hectopascals::new(1015.0));
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// Defines an `f64` quantity with total ordering, deref and a display suffix.
macro_rules! quantity {
    ($(#[$meta:meta])* $name:ident, $suffix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(f64);

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl From<f64> for $name {
            #[inline]
            fn from(value: f64) -> Self {
                Self(value)
            }
        }

        impl $name {
            /// Wrap a raw value
            #[inline]
            #[must_use]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Raw value
            #[inline]
            #[must_use]
            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.0, $suffix)
            }
        }
    };
}

quantity!(
    /// Great-circle or radial distance in kilometres
    Kilometers,
    "km"
);

quantity!(
    /// Pressure in hectopascals
    Hectopascals,
    "hPa"
);

quantity!(
    /// Wind speed in metres per second
    MetersPerSecond,
    "m/s"
);

quantity!(
    /// Duration in hours
    Hours,
    "h"
);

impl MetersPerSecond {
    /// Convert to km/h, the unit used in track files
    #[inline]
    #[must_use]
    pub fn to_kilometers_per_hour(self) -> f64 {
        self.0 * 3.6
    }
}

impl Hectopascals {
    /// Convert to pascals
    #[inline]
    #[must_use]
    pub fn to_pascals(self) -> f64 {
        self.0 * 100.0
    }
}

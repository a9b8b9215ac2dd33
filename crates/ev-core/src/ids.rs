//! Strongly typed identifier wrappers.
//!
//! Network ids (`NodeId`, `LinkId`) are dense indices into the CSR arrays of
//! the transit network.  Fleet and infrastructure ids (`VehicleId`,
//! `ProfileId`, `ChargerId`) are external keys and may be sparse.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Index of a network node (stop or junction).
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed network link.
    pub struct LinkId(u32);
}

typed_id! {
    /// Identity of a vehicle in the fleet specification.
    pub struct VehicleId(u32);
}

typed_id! {
    /// Powertrain profile (drive/aux consumption coefficients) of a vehicle class.
    pub struct ProfileId(u16);
}

typed_id! {
    /// Identity of a charging opportunity.
    pub struct ChargerId(u32);
}

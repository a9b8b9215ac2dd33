//! Transport modes and the per-link set of modes allowed to use a link.

/// A mode of transport that the network can be filtered for.
///
/// The discriminant is the mode's bit position in [`ModeSet`] and its slot in
/// per-mode caches, so variants are dense from 0.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TransportMode {
    /// Scheduled bus service.
    Bus = 0,
    /// Tram / light rail.
    Tram = 1,
    /// Heavy rail.
    Rail = 2,
    /// Ferry.
    Ferry = 3,
    /// Transfer / feeder vehicle on the road network (shuttles, ride-hail).
    Car = 4,
}

impl TransportMode {
    /// Number of variants; sizes per-mode arrays.
    pub const COUNT: usize = 5;

    pub const ALL: [TransportMode; Self::COUNT] = [
        TransportMode::Bus,
        TransportMode::Tram,
        TransportMode::Rail,
        TransportMode::Ferry,
        TransportMode::Car,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Bus   => "bus",
            TransportMode::Tram  => "tram",
            TransportMode::Rail  => "rail",
            TransportMode::Ferry => "ferry",
            TransportMode::Car   => "car",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportMode {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransportMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| crate::CoreError::Config(format!("unknown transport mode {s:?}")))
    }
}

// ── ModeSet ───────────────────────────────────────────────────────────────────

/// Bitmask of [`TransportMode`]s permitted on a link.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeSet(u8);

impl ModeSet {
    pub const EMPTY: ModeSet = ModeSet(0);

    /// Every mode.
    pub const ALL: ModeSet = ModeSet((1 << TransportMode::COUNT) - 1);

    pub fn single(mode: TransportMode) -> Self {
        ModeSet(1 << mode.index())
    }

    pub fn of(modes: &[TransportMode]) -> Self {
        modes.iter().fold(ModeSet::EMPTY, |set, &m| set.with(m))
    }

    #[must_use]
    pub fn with(self, mode: TransportMode) -> Self {
        ModeSet(self.0 | (1 << mode.index()))
    }

    #[inline]
    pub fn contains(self, mode: TransportMode) -> bool {
        self.0 & (1 << mode.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = TransportMode> {
        TransportMode::ALL.into_iter().filter(move |&m| self.contains(m))
    }
}

impl From<TransportMode> for ModeSet {
    fn from(mode: TransportMode) -> Self {
        ModeSet::single(mode)
    }
}

//! Per-direction edge flags
//!
//! Flags are a fixed-width 32-bit set. Bit positions are part of the data
//! format: gaps left by retired flags are kept as reserved bits and never reused.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeFlags(u32);

impl EdgeFlags {
    pub const NONE: Self = Self(0);

    // Bit 0 is reserved (formerly UNUSED)
    pub const BIKE_PATH: Self = Self(1 << 1);
    pub const SIDEWALK: Self = Self(1 << 2);
    pub const CROSSING: Self = Self(1 << 3);
    pub const ROUNDABOUT: Self = Self(1 << 4);
    pub const ELEVATOR: Self = Self(1 << 5);
    pub const STAIRS: Self = Self(1 << 6);
    pub const PLATFORM: Self = Self(1 << 7);
    pub const BOGUS_NAME: Self = Self(1 << 8);
    pub const NO_THRU_TRAFFIC_PEDESTRIAN: Self = Self(1 << 9);
    pub const SLOPE_OVERRIDE: Self = Self(1 << 10);
    /// One-way connection from a street to a transit stop
    pub const TRANSIT_LINK: Self = Self(1 << 11);
    // Bits 12..=15 are reserved
    pub const ALLOWS_PEDESTRIAN: Self = Self(1 << 16);
    pub const ALLOWS_BIKE: Self = Self(1 << 17);
    pub const ALLOWS_CAR: Self = Self(1 << 18);
    pub const ALLOWS_WHEELCHAIR: Self = Self(1 << 19);
    pub const NO_THRU_TRAFFIC_BIKE: Self = Self(1 << 20);
    pub const NO_THRU_TRAFFIC_CAR: Self = Self(1 << 21);
    // Bits 22..=31 are reserved

    /// Bits that must never be set
    pub const RESERVED: Self = Self(1 | (0b1111 << 12) | (0x3ff << 22));

    pub const ALLOWS_ALL: Self = Self(
        Self::ALLOWS_PEDESTRIAN.0 | Self::ALLOWS_BIKE.0 | Self::ALLOWS_CAR.0,
    );

    const NAMED: [(&'static str, EdgeFlags); 18] = [
        ("BIKE_PATH", Self::BIKE_PATH),
        ("SIDEWALK", Self::SIDEWALK),
        ("CROSSING", Self::CROSSING),
        ("ROUNDABOUT", Self::ROUNDABOUT),
        ("ELEVATOR", Self::ELEVATOR),
        ("STAIRS", Self::STAIRS),
        ("PLATFORM", Self::PLATFORM),
        ("BOGUS_NAME", Self::BOGUS_NAME),
        ("NO_THRU_TRAFFIC_PEDESTRIAN", Self::NO_THRU_TRAFFIC_PEDESTRIAN),
        ("SLOPE_OVERRIDE", Self::SLOPE_OVERRIDE),
        ("TRANSIT_LINK", Self::TRANSIT_LINK),
        ("ALLOWS_PEDESTRIAN", Self::ALLOWS_PEDESTRIAN),
        ("ALLOWS_BIKE", Self::ALLOWS_BIKE),
        ("ALLOWS_CAR", Self::ALLOWS_CAR),
        ("ALLOWS_WHEELCHAIR", Self::ALLOWS_WHEELCHAIR),
        ("NO_THRU_TRAFFIC_BIKE", Self::NO_THRU_TRAFFIC_BIKE),
        ("NO_THRU_TRAFFIC_CAR", Self::NO_THRU_TRAFFIC_CAR),
        ("RESERVED", Self::RESERVED),
    ];

    /// Builds a flag set from raw bits, rejecting reserved bits.
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & Self::RESERVED.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Builds a flag set from raw bits, silently clearing reserved bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & !Self::RESERVED.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set in `self`
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        debug_assert!(!other.intersects(Self::RESERVED), "reserved edge flag bit");
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Derives permission and no-through-traffic bits from per-mode access values.
    ///
    /// A mode is allowed unless its access is `No`, `InheritedNo` or `Dismount`.
    /// `Private` and `Destination` access additionally mark the edge as
    /// no-through-traffic for that mode.
    pub fn from_access(permissions: &[(TransportMode, AccessPermission)]) -> Self {
        let mut flags = Self::NONE;
        for &(mode, access) in permissions {
            if access.allows_travel() {
                flags.insert(mode.allows_flag());
            }
            if access.restricts_through_traffic() {
                flags.insert(mode.no_thru_traffic_flag());
            }
        }
        flags
    }

    /// Travel permissions encoded in this flag set
    pub fn permissions(self) -> TraversalPermission {
        let mut permission = TraversalPermission::NONE;
        if self.contains(Self::ALLOWS_PEDESTRIAN) {
            permission = permission | TraversalPermission::PEDESTRIAN;
        }
        if self.contains(Self::ALLOWS_BIKE) {
            permission = permission | TraversalPermission::BICYCLE;
        }
        if self.contains(Self::ALLOWS_CAR) {
            permission = permission | TraversalPermission::CAR;
        }
        permission
    }

    /// Names of the set flags in bit order
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(_, flag)| self.intersects(*flag))
            .map(|(name, _)| name)
    }
}

impl BitOr for EdgeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EdgeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

impl BitAnd for EdgeFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for EdgeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EdgeFlags(")?;
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(")")
    }
}

/// Travel modes that carry their own permission bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Foot,
    Bicycle,
    Car,
}

impl TransportMode {
    pub const fn allows_flag(self) -> EdgeFlags {
        match self {
            TransportMode::Foot => EdgeFlags::ALLOWS_PEDESTRIAN,
            TransportMode::Bicycle => EdgeFlags::ALLOWS_BIKE,
            TransportMode::Car => EdgeFlags::ALLOWS_CAR,
        }
    }

    pub const fn no_thru_traffic_flag(self) -> EdgeFlags {
        match self {
            TransportMode::Foot => EdgeFlags::NO_THRU_TRAFFIC_PEDESTRIAN,
            TransportMode::Bicycle => EdgeFlags::NO_THRU_TRAFFIC_BIKE,
            TransportMode::Car => EdgeFlags::NO_THRU_TRAFFIC_CAR,
        }
    }
}

/// Access value of a way for a single mode, as produced by tag classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPermission {
    Yes,
    No,
    Destination,
    Dismount,
    Designated,
    Private,
    InheritedYes,
    InheritedNo,
    InheritedDesignated,
    Unknown,
}

impl AccessPermission {
    pub const fn allows_travel(self) -> bool {
        !matches!(
            self,
            AccessPermission::No | AccessPermission::InheritedNo | AccessPermission::Dismount
        )
    }

    pub const fn restricts_through_traffic(self) -> bool {
        matches!(
            self,
            AccessPermission::Private | AccessPermission::Destination
        )
    }
}

/// Modes allowed to traverse an edge
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraversalPermission(u8);

impl TraversalPermission {
    pub const NONE: Self = Self(0);
    pub const PEDESTRIAN: Self = Self(1);
    pub const BICYCLE: Self = Self(1 << 1);
    pub const CAR: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    pub const fn allows(self, mode: TransportMode) -> bool {
        let bit = match mode {
            TransportMode::Foot => Self::PEDESTRIAN,
            TransportMode::Bicycle => Self::BICYCLE,
            TransportMode::Car => Self::CAR,
        };
        self.0 & bit.0 != 0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TraversalPermission {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for TraversalPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            0 => "NONE",
            0b001 => "PEDESTRIAN",
            0b010 => "BICYCLE",
            0b011 => "PEDESTRIAN_AND_BICYCLE",
            0b100 => "CAR",
            0b101 => "PEDESTRIAN_AND_CAR",
            0b110 => "BICYCLE_AND_CAR",
            _ => "ALL",
        };
        f.write_str(name)
    }
}

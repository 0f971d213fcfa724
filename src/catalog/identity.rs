use serde::{Deserialize, Serialize};
use std::fmt;

/// Versioned key for a composite manifest (e.g., `notifications_v1`).
///
/// Recorded so embedders can tell which catalog snapshot a registry was
/// activated from.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogKey(pub String);

/// Stable identifier for a capability interface.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(pub String);

/// Stable identifier for a composite component declaration.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeId(pub String);

/// Stable identifier for a concrete implementation of a capability.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImplementationId(pub String);

/// Identifier for a method declared on a capability interface.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodId(pub String);

/// The two delegate tiers an implementation can be classified into.
///
/// This is a closed set; manifest entries carrying any other tier value fail
/// to parse and are excluded by the lenient loader.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Primary,
    Secondary,
}

/// Method-level routing declaration: which tier(s) must service a call.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    Primary,
    Secondary,
    Both,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
        }
    }
}

impl Propagation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Propagation::Primary => "primary",
            Propagation::Secondary => "secondary",
            Propagation::Both => "both",
        }
    }

    /// True when the declaration obliges the given tier to have bindings.
    ///
    /// `Both` obliges both tiers, so it participates in the missing-primary
    /// and the missing-secondary validation checks.
    pub fn requires(&self, tier: Tier) -> bool {
        match self {
            Propagation::Primary => tier == Tier::Primary,
            Propagation::Secondary => tier == Tier::Secondary,
            Propagation::Both => true,
        }
    }

    /// Dispatch order for the declaration: the full primary tier precedes
    /// the secondary tier when both are selected.
    pub fn tiers(&self) -> &'static [Tier] {
        match self {
            Propagation::Primary => &[Tier::Primary],
            Propagation::Secondary => &[Tier::Secondary],
            Propagation::Both => &[Tier::Primary, Tier::Secondary],
        }
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ImplementationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

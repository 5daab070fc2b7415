// Shared types for the topology/workload generation pipeline

use thiserror::Error;

/// Node identifier. Generators allocate contiguous ids starting at 0.
pub type NodeId = u64;

/// Identifies one directed edge in a [`crate::pcn_graph::ChannelGraph`].
///
/// `instance` disambiguates parallel edges when the container is a
/// multigraph; it is always 0 in simple graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub source: NodeId,
    pub target: NodeId,
    pub instance: u32,
}

impl EdgeKey {
    pub fn new(source: NodeId, target: NodeId, instance: u32) -> Self {
        Self {
            source,
            target,
            instance,
        }
    }

    /// Key of the edge in the opposite direction (instance not carried over:
    /// reverse insertions get their own instance from the container).
    pub fn reversed_endpoints(&self) -> (NodeId, NodeId) {
        (self.target, self.source)
    }
}

// ============================================================================
// Channel Attributes
// ============================================================================

/// Per-direction financial/operational attributes of a channel.
///
/// Every directed edge of a normalized graph carries exactly one record.
/// The two directions of a channel are independent records.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelAttributes {
    /// Outbound liquidity available on this direction
    pub capacity: f64,

    /// Link quality in [0, 1]
    pub link_quality: f64,

    /// Forwarding fee charged by the edge source
    pub fee: f64,

    /// Maximum number of in-flight HTLCs accepted
    pub max_accepted_htlcs: u32,

    /// Smallest HTLC amount the channel accepts
    pub htlc_minimum_msat: f64,

    /// Reserve the counterparty must keep on its side
    pub channel_reserve_satoshis: f64,

    /// Forwarding delay in ticks
    pub delay: u32,
}

/// Attribute keys in the fixed order used by the topology artifact.
pub const ATTRIBUTE_KEYS: [&str; 7] = [
    "capacity",
    "link_quality",
    "fee",
    "max_accepted_HTLCs",
    "HTLC_minimum_msat",
    "channel_reserve_satoshis",
    "delay",
];

// ============================================================================
// Errors
// ============================================================================

/// Errors produced by the generation pipeline.
///
/// None of these are transient: given the same inputs and seed the same
/// failure reproduces, so there is no retry path anywhere.
#[derive(Debug, Error)]
pub enum GenError {
    /// Invalid configuration (mutually exclusive options, bad model
    /// parameters). Reported before any work is performed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A sampling request exceeded the filtered population of a dataset.
    #[error(
        "insufficient population for '{field}': requested {requested}, \
         only {available} values available"
    )]
    InsufficientPopulation {
        field: String,
        requested: usize,
        available: usize,
    },

    /// An attribute value stack emptied before every edge was assigned.
    #[error(
        "attribute pool for '{field}' exhausted after {assigned} of {total} edges"
    )]
    AttributePoolExhausted {
        field: String,
        assigned: usize,
        total: usize,
    },

    /// Fewer than 2 eligible payment endpoints.
    #[error("insufficient end hosts: found {found}, need at least 2")]
    InsufficientEndHosts { found: usize },

    /// Persistence was asked to write an edge without an attribute record.
    #[error("edge {source} -> {target} (instance {instance}) has no attributes")]
    MissingAttributes {
        source: NodeId,
        target: NodeId,
        instance: u32,
    },

    /// Malformed statistics, dataset, or topology input.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

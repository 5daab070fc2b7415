//! # pcnGen - Payment Channel Network Input Synthesis
//!
//! Generates the input artifacts for a payment-channel-network simulator:
//! a randomized bidirectional topology with per-channel financial
//! attributes, and a time-ordered payment workload referencing that
//! topology's endpoints.
//!
//! ## Core Components
//!
//! - **ChannelGraph**: directed (optionally multi-) graph container with
//!   bidirectional normalization
//! - **Topology Models**: scale-free, Watts-Strogatz, and Barabasi-Albert
//!   random graph synthesis
//! - **Statistical Adapter**: empirical channel statistics and payment
//!   datasets, subsampling, currency conversion
//! - **Attribute Assigner**: one 7-field record per channel direction,
//!   synthetic or empirically sampled
//! - **Workload Generator**: end-host selection and timestamp-sorted
//!   payment sequences
//!
//! ## Pipeline
//!
//! ```no_run
//! use pcn_gen::{
//!     assign_attributes, end_hosts, generate_workload, synthesize,
//!     AmountSource, AttributeMode, CorrelationPolicy, EndHostMode, TopologyModel,
//! };
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::from_seed([0u8; 32]);
//!
//! let mut graph = synthesize(
//!     &TopologyModel::WattsStrogatz { k: 2, p: 0.1 },
//!     50,
//!     &mut rng,
//! )
//! .unwrap();
//! graph.normalize();
//! assign_attributes(
//!     &mut graph,
//!     AttributeMode::Synthetic,
//!     CorrelationPolicy::None,
//!     &mut rng,
//! )
//! .unwrap();
//!
//! let hosts = end_hosts(&graph, EndHostMode::LeavesOnly).unwrap();
//! let amounts = AmountSource::Uniform { min: 0.1, max: 1.0 };
//! let workload = generate_workload(100, amounts, &hosts, 5000, &mut rng).unwrap();
//! assert_eq!(workload.len(), 100);
//! ```
//!
//! The whole pipeline is single-threaded batch work: it runs to completion
//! or fails before any artifact is written.

pub mod pcn_attributes;
pub mod pcn_graph;
pub mod pcn_interface;
pub mod pcn_models;
pub mod pcn_stats;
pub mod pcn_store;
pub mod pcn_workload;

// Re-export commonly used types
pub use pcn_attributes::{assign_attributes, AttributeMode, CorrelationPolicy};
pub use pcn_graph::ChannelGraph;
pub use pcn_interface::{ChannelAttributes, EdgeKey, GenError, NodeId};
pub use pcn_models::{synthesize, TopologyModel};
pub use pcn_stats::{ChannelPopulations, EmpiricalSample, PaymentDataset};
pub use pcn_store::{load_topology, write_topology, write_workload};
pub use pcn_workload::{
    end_hosts, generate_workload, resolve_amount_source, AmountOptions, AmountSource,
    EndHostMode, Payment,
};

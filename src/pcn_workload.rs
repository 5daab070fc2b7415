// End-host selection and payment workload construction

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use rand::rngs::StdRng;
use rand::Rng;

use crate::pcn_graph::ChannelGraph;
use crate::pcn_interface::{GenError, NodeId};
use crate::pcn_stats::{
    dataset_amounts, sample_without_replacement, EmpiricalSample, PaymentDataset,
};

// ============================================================================
// End-Host Selection
// ============================================================================

/// Which nodes may originate or receive payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndHostMode {
    /// Only true leaves: nodes with exactly one outgoing channel. On a
    /// normalized graph this is "exactly one neighbor".
    LeavesOnly,

    /// Every node in the graph.
    AllNodes,
}

/// Filters the graph's nodes into the eligible payment-endpoint set.
///
/// Workload generation samples 2 distinct participants per payment, so
/// fewer than 2 eligible hosts is a hard failure.
pub fn end_hosts(graph: &ChannelGraph, mode: EndHostMode) -> Result<Vec<NodeId>, GenError> {
    let hosts: Vec<NodeId> = match mode {
        EndHostMode::LeavesOnly => graph
            .nodes()
            .filter(|node| graph.out_degree(*node) == 1)
            .collect(),
        EndHostMode::AllNodes => graph.nodes().collect(),
    };

    if hosts.len() < 2 {
        return Err(GenError::InsufficientEndHosts { found: hosts.len() });
    }

    info!("{} eligible end hosts", hosts.len());
    Ok(hosts)
}

// ============================================================================
// Payments
// ============================================================================

/// A single payment instruction in the workload.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub source: NodeId,
    pub destination: NodeId,
    pub amount: f64,
    pub timestamp: u64,
}

/// Where payment amounts come from.
#[derive(Debug, Clone)]
pub enum AmountSource {
    /// Uniform draw per payment.
    Uniform { min: f64, max: f64 },

    /// Pre-drawn dataset sample, consumed one value per payment.
    Empirical(EmpiricalSample<f64>),
}

/// Amount configuration as it arrives from the scenario surface.
#[derive(Debug, Clone)]
pub struct AmountOptions {
    pub min_payment: f64,
    pub max_payment: f64,
    pub credit_card: bool,
    pub e_commerce: bool,
    pub credit_card_path: PathBuf,
    pub e_commerce_path: PathBuf,
}

impl AmountOptions {
    /// The selected dataset, if any. Selecting both is a configuration
    /// error, reported here before any file is opened.
    fn dataset(&self) -> Result<Option<(PaymentDataset, &Path)>, GenError> {
        match (self.credit_card, self.e_commerce) {
            (true, true) => Err(GenError::Config(
                "credit_card and e_commerce can't be used together".to_string(),
            )),
            (true, false) => Ok(Some((PaymentDataset::CreditCard, &self.credit_card_path))),
            (false, true) => Ok(Some((PaymentDataset::ECommerce, &self.e_commerce_path))),
            (false, false) => Ok(None),
        }
    }
}

/// Validates the amount configuration and, for a dataset source, loads,
/// filters, and pre-draws exactly `n_payments` amounts.
pub fn resolve_amount_source(
    options: &AmountOptions,
    n_payments: usize,
    rng: &mut StdRng,
) -> Result<AmountSource, GenError> {
    match options.dataset()? {
        None => {
            if options.min_payment <= 0.0 {
                return Err(GenError::Config(format!(
                    "min_payment must be positive, got {}",
                    options.min_payment
                )));
            }
            if options.min_payment > options.max_payment {
                return Err(GenError::Config(format!(
                    "min_payment {} exceeds max_payment {}",
                    options.min_payment, options.max_payment
                )));
            }
            Ok(AmountSource::Uniform {
                min: options.min_payment,
                max: options.max_payment,
            })
        }
        Some((dataset, path)) => {
            let content = fs::read_to_string(path)?;
            let amounts = dataset_amounts(&content, dataset.amount_column())?;
            info!(
                "{} dataset: {} positive amounts available",
                dataset.name(),
                amounts.len()
            );
            let sample =
                sample_without_replacement(&amounts, n_payments, dataset.amount_column(), rng)?;
            Ok(AmountSource::Empirical(sample))
        }
    }
}

// ============================================================================
// Workload Generation
// ============================================================================

/// Produces exactly `n_payments` payments between distinct end hosts,
/// stably sorted by ascending timestamp.
pub fn generate_workload(
    n_payments: usize,
    mut amounts: AmountSource,
    hosts: &[NodeId],
    time_window: u64,
    rng: &mut StdRng,
) -> Result<Vec<Payment>, GenError> {
    if hosts.len() < 2 {
        return Err(GenError::InsufficientEndHosts { found: hosts.len() });
    }
    if time_window == 0 {
        return Err(GenError::Config("time_window must be at least 1".to_string()));
    }

    let mut payments = Vec::with_capacity(n_payments);
    for _ in 0..n_payments {
        let pair = rand::seq::index::sample(rng, hosts.len(), 2);
        let source = hosts[pair.index(0)];
        let destination = hosts[pair.index(1)];

        let amount = match &mut amounts {
            AmountSource::Uniform { min, max } => rng.gen_range(*min..=*max),
            AmountSource::Empirical(sample) => {
                sample.pop().ok_or_else(|| GenError::AttributePoolExhausted {
                    field: "amount".to_string(),
                    assigned: payments.len(),
                    total: n_payments,
                })?
            }
        };
        let timestamp = rng.gen_range(1..=time_window);

        payments.push(Payment {
            source,
            destination,
            amount,
            timestamp,
        });
    }

    // stable: equal timestamps keep generation order
    payments.sort_by_key(|payment| payment.timestamp);

    info!(
        "generated {} payments over window [1, {}]",
        payments.len(),
        time_window
    );
    Ok(payments)
}

// Per-channel attribute assignment

use hashbrown::HashMap;
use log::info;
use rand::rngs::StdRng;
use rand::Rng;

use crate::pcn_graph::ChannelGraph;
use crate::pcn_interface::{ChannelAttributes, EdgeKey, GenError};
use crate::pcn_stats::{
    sample_without_replacement, satoshis_to_euro, ChannelPopulations, FieldSummary,
};

// ============================================================================
// Assignment Parameters
// ============================================================================

/// Synthetic capacity range.
pub const CAPACITY_RANGE: (f64, f64) = (0.0, 10.0);

/// Link quality range, synthetic in both modes.
pub const LINK_QUALITY_RANGE: (f64, f64) = (0.0, 1.0);

/// Synthetic fee range.
pub const FEE_RANGE: (f64, f64) = (1e-5, 1e-4);

/// Replicated constants; never empirically sampled.
pub const MAX_ACCEPTED_HTLCS: u32 = 483;
pub const HTLC_MINIMUM_MSAT: f64 = 0.1;
pub const CHANNEL_RESERVE_SATOSHIS: f64 = 0.01;
pub const DELAY_TICKS: u32 = 100;

/// How sampled values pair with edges.
///
/// `None` is independent marginal sampling: each attribute's value stack is
/// shuffled on its own and consumed against edge enumeration order, so the
/// pairing of values to edges (and of attributes to each other) carries no
/// correlation. A joint policy sampling correlated tuples from the same
/// source row would be a new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CorrelationPolicy {
    None,
}

/// Where attribute values come from.
#[derive(Debug, Clone, Copy)]
pub enum AttributeMode<'a> {
    /// Uniform draws from the fixed synthetic ranges.
    Synthetic,

    /// Capacity, fee, and HTLC minimum sampled from real channel
    /// statistics; the remaining fields as in synthetic mode.
    Empirical(&'a ChannelPopulations),
}

// ============================================================================
// Assignment
// ============================================================================

/// Attaches one [`ChannelAttributes`] record to every edge of a normalized
/// graph.
///
/// Records are built into a local map keyed by [`EdgeKey`] (instance-scoped,
/// so parallel edges of a multigraph each get their own record) and applied
/// to the graph as a single batch.
pub fn assign_attributes(
    graph: &mut ChannelGraph,
    mode: AttributeMode<'_>,
    policy: CorrelationPolicy,
    rng: &mut StdRng,
) -> Result<(), GenError> {
    let total = graph.edge_count();

    let (mut capacities, mut fees, mut htlc_minimums) = match mode {
        AttributeMode::Synthetic => (
            uniform_values(total, CAPACITY_RANGE, rng),
            uniform_values(total, FEE_RANGE, rng),
            vec![HTLC_MINIMUM_MSAT; total],
        ),
        AttributeMode::Empirical(populations) => empirical_stacks(populations, total, rng)?,
    };

    let mut link_qualities = uniform_values(total, LINK_QUALITY_RANGE, rng);
    let mut max_htlcs = vec![MAX_ACCEPTED_HTLCS; total];
    let mut reserves = vec![CHANNEL_RESERVE_SATOSHIS; total];
    let mut delays = vec![DELAY_TICKS; total];

    match policy {
        // stacks are consumed LIFO against edge enumeration order; the
        // value-to-edge pairing is arbitrary by construction
        CorrelationPolicy::None => {}
    }

    let edges: Vec<EdgeKey> = graph.edges().to_vec();
    let mut records: HashMap<EdgeKey, ChannelAttributes> = HashMap::with_capacity(total);

    for (assigned, edge) in edges.iter().enumerate() {
        let attributes = ChannelAttributes {
            capacity: pop_value(&mut capacities, "capacity", assigned, total)?,
            link_quality: pop_value(&mut link_qualities, "link_quality", assigned, total)?,
            fee: pop_value(&mut fees, "fee", assigned, total)?,
            max_accepted_htlcs: pop_value(&mut max_htlcs, "max_accepted_HTLCs", assigned, total)?,
            htlc_minimum_msat: pop_value(
                &mut htlc_minimums,
                "HTLC_minimum_msat",
                assigned,
                total,
            )?,
            channel_reserve_satoshis: pop_value(
                &mut reserves,
                "channel_reserve_satoshis",
                assigned,
                total,
            )?,
            delay: pop_value(&mut delays, "delay", assigned, total)?,
        };
        records.insert(*edge, attributes);
    }

    info!("assigned attribute records to {} edges", records.len());
    graph.set_edge_attributes(records);
    Ok(())
}

/// Builds the capacity/fee/HTLC-minimum stacks from empirical populations:
/// `total` values sampled per field, re-denominated in euros, capacity
/// rounded to whole units.
fn empirical_stacks(
    populations: &ChannelPopulations,
    total: usize,
    rng: &mut StdRng,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), GenError> {
    for (field, values) in [
        (ChannelPopulations::CAPACITY_FIELD, &populations.capacities),
        (ChannelPopulations::FEE_BASE_FIELD, &populations.fee_bases),
        (ChannelPopulations::MIN_HTLC_FIELD, &populations.min_htlcs),
    ] {
        if let Some(summary) = FieldSummary::of(values) {
            summary.log(field);
        }
    }

    let capacities = sample_without_replacement(
        &populations.capacities,
        total,
        ChannelPopulations::CAPACITY_FIELD,
        rng,
    )?
    .values
    .into_iter()
    .map(|v| satoshis_to_euro(v as f64).round())
    .collect();

    let fees = sample_without_replacement(
        &populations.fee_bases,
        total,
        ChannelPopulations::FEE_BASE_FIELD,
        rng,
    )?
    .values
    .into_iter()
    .map(|v| satoshis_to_euro(v as f64))
    .collect();

    let htlc_minimums = sample_without_replacement(
        &populations.min_htlcs,
        total,
        ChannelPopulations::MIN_HTLC_FIELD,
        rng,
    )?
    .values
    .into_iter()
    .map(|v| satoshis_to_euro(v as f64))
    .collect();

    Ok((capacities, fees, htlc_minimums))
}

fn uniform_values(n: usize, range: (f64, f64), rng: &mut StdRng) -> Vec<f64> {
    (0..n).map(|_| rng.gen_range(range.0..=range.1)).collect()
}

fn pop_value<T>(
    stack: &mut Vec<T>,
    field: &str,
    assigned: usize,
    total: usize,
) -> Result<T, GenError> {
    stack.pop().ok_or_else(|| GenError::AttributePoolExhausted {
        field: field.to_string(),
        assigned,
        total,
    })
}

// Topology and workload artifact persistence
//
// Artifacts are rendered fully in memory and written in one operation, so a
// failure during generation never leaves a truncated file behind.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use hashbrown::HashMap;
use log::info;

use crate::pcn_graph::ChannelGraph;
use crate::pcn_interface::{ChannelAttributes, EdgeKey, GenError, ATTRIBUTE_KEYS};
use crate::pcn_workload::Payment;

// ============================================================================
// Topology Artifact
// ============================================================================

/// Renders the topology artifact: one line per directed edge,
/// `source target` followed by the 7 attribute key=value pairs in fixed
/// order.
pub fn topology_to_string(graph: &ChannelGraph) -> Result<String, GenError> {
    let mut out = String::new();

    for edge in graph.edges() {
        let attrs = graph
            .attributes(edge)
            .ok_or(GenError::MissingAttributes {
                source: edge.source,
                target: edge.target,
                instance: edge.instance,
            })?;
        out.push_str(&format!(
            "{} {} capacity={} link_quality={} fee={} max_accepted_HTLCs={} \
             HTLC_minimum_msat={} channel_reserve_satoshis={} delay={}\n",
            edge.source,
            edge.target,
            attrs.capacity,
            attrs.link_quality,
            attrs.fee,
            attrs.max_accepted_htlcs,
            attrs.htlc_minimum_msat,
            attrs.channel_reserve_satoshis,
            attrs.delay,
        ));
    }

    Ok(out)
}

pub fn write_topology(path: &Path, graph: &ChannelGraph) -> Result<(), GenError> {
    let body = topology_to_string(graph)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, body)?;
    info!(
        "wrote topology with {} edges to {}",
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

/// Reads a topology artifact back into a graph.
///
/// The result is a multigraph whose edge order is the file's line order;
/// parallel lines for the same node pair become parallel edges.
pub fn parse_topology(content: &str) -> Result<ChannelGraph, GenError> {
    let mut graph = ChannelGraph::new(true);
    let mut records: HashMap<EdgeKey, ChannelAttributes> = HashMap::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 2 + ATTRIBUTE_KEYS.len() {
            return Err(GenError::Parse {
                line: line_no,
                message: format!(
                    "expected source, target and {} attributes, got {} fields",
                    ATTRIBUTE_KEYS.len(),
                    tokens.len()
                ),
            });
        }

        let source = parse_number(tokens[0], line_no, "source")?;
        let target = parse_number(tokens[1], line_no, "target")?;

        let mut values = [""; 7];
        for (i, token) in tokens[2..].iter().enumerate() {
            let (key, value) = token.split_once('=').ok_or_else(|| GenError::Parse {
                line: line_no,
                message: format!("expected key=value, got '{}'", token),
            })?;
            if key != ATTRIBUTE_KEYS[i] {
                return Err(GenError::Parse {
                    line: line_no,
                    message: format!("expected attribute '{}', got '{}'", ATTRIBUTE_KEYS[i], key),
                });
            }
            values[i] = value;
        }

        let attributes = ChannelAttributes {
            capacity: parse_number(values[0], line_no, "capacity")?,
            link_quality: parse_number(values[1], line_no, "link_quality")?,
            fee: parse_number(values[2], line_no, "fee")?,
            max_accepted_htlcs: parse_number(values[3], line_no, "max_accepted_HTLCs")?,
            htlc_minimum_msat: parse_number(values[4], line_no, "HTLC_minimum_msat")?,
            channel_reserve_satoshis: parse_number(values[5], line_no, "channel_reserve_satoshis")?,
            delay: parse_number(values[6], line_no, "delay")?,
        };

        let key = graph.add_edge(source, target);
        records.insert(key, attributes);
    }

    graph.set_edge_attributes(records);
    Ok(graph)
}

pub fn load_topology(path: &Path) -> Result<ChannelGraph, GenError> {
    let content = fs::read_to_string(path)?;
    let graph = parse_topology(&content)?;
    info!(
        "loaded topology with {} nodes and {} edges from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

fn parse_number<T: FromStr>(token: &str, line: usize, what: &str) -> Result<T, GenError> {
    token.parse::<T>().map_err(|_| GenError::Parse {
        line,
        message: format!("invalid {} value '{}'", what, token),
    })
}

// ============================================================================
// Workload Artifact
// ============================================================================

/// Renders the workload artifact: `source destination amount timestamp`,
/// space-delimited, no header, in the given (timestamp-sorted) order.
pub fn workload_to_string(payments: &[Payment]) -> String {
    let mut out = String::new();
    for payment in payments {
        out.push_str(&format!(
            "{} {} {} {}\n",
            payment.source, payment.destination, payment.amount, payment.timestamp
        ));
    }
    out
}

pub fn write_workload(path: &Path, payments: &[Payment]) -> Result<(), GenError> {
    let body = workload_to_string(payments);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, body)?;
    info!("wrote {} payments to {}", payments.len(), path.display());
    Ok(())
}

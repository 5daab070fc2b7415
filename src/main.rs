// Scenario Runner - Generate topologies and workloads from scenario YAML files
//
// Usage:
//   cargo run -- scenarios/scale-free.yaml
//   cargo run -- scenarios/lightning.yaml --seed 0x1234...
//
// A scenario file carries an optional `topology` section and an optional
// `workload` section; whichever is present runs, in that order.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simple_logger::SimpleLogger;

use pcn_gen::{
    assign_attributes, end_hosts, generate_workload, load_topology, resolve_amount_source,
    synthesize, write_topology, write_workload, AmountOptions, AttributeMode, ChannelPopulations,
    CorrelationPolicy, EndHostMode, GenError, PaymentDataset, TopologyModel,
};

// ============================================================================
// Scenario File Format
// ============================================================================

#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    meta: ScenarioMeta,

    #[serde(default)]
    topology: Option<TopologyScenario>,

    #[serde(default)]
    workload: Option<WorkloadScenario>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ModelKind {
    ScaleFree,
    WattsStrogatz,
    BarabasiAlbert,
}

#[derive(Debug, serde::Deserialize)]
struct TopologyScenario {
    model: ModelKind,

    #[serde(default = "default_nodes")]
    nodes: usize,

    // scale-free shape parameters
    #[serde(default = "default_alpha")]
    alpha: f64,
    #[serde(default = "default_beta")]
    beta: f64,
    #[serde(default = "default_gamma")]
    gamma: f64,

    // watts-strogatz shape parameters
    #[serde(default = "default_k")]
    k: usize,
    #[serde(default = "default_p")]
    p: f64,

    // barabasi-albert shape parameter
    #[serde(default = "default_m")]
    m: usize,

    /// Channel capacities/fees modeled from real-world channel statistics
    #[serde(default)]
    empirical_channels: bool,

    #[serde(default = "default_channel_stats")]
    channel_stats: PathBuf,

    #[serde(default = "default_topology_path")]
    output: PathBuf,
}

#[derive(Debug, serde::Deserialize)]
struct WorkloadScenario {
    #[serde(default = "default_n_payments")]
    n_payments: usize,

    #[serde(default = "default_min_payment")]
    min_payment: f64,

    #[serde(default = "default_max_payment")]
    max_payment: f64,

    #[serde(default = "default_time_window")]
    time_window: u64,

    /// Payments issued by any node, not only end hosts
    #[serde(default)]
    any_node: bool,

    // amount datasets (mutually exclusive)
    #[serde(default)]
    credit_card: bool,
    #[serde(default)]
    e_commerce: bool,

    #[serde(default = "default_credit_card_path")]
    credit_card_path: PathBuf,

    #[serde(default = "default_e_commerce_path")]
    e_commerce_path: PathBuf,

    #[serde(default = "default_topology_path")]
    topology: PathBuf,

    #[serde(default = "default_workload_path")]
    output: PathBuf,
}

fn default_nodes() -> usize {
    10
}
fn default_alpha() -> f64 {
    0.5
}
fn default_beta() -> f64 {
    0.00001
}
fn default_gamma() -> f64 {
    0.49999
}
fn default_k() -> usize {
    2
}
fn default_p() -> f64 {
    0.1
}
fn default_m() -> usize {
    2
}
fn default_channel_stats() -> PathBuf {
    PathBuf::from("datasets/channels.txt")
}
fn default_credit_card_path() -> PathBuf {
    PathBuf::from(PaymentDataset::CreditCard.default_path())
}
fn default_e_commerce_path() -> PathBuf {
    PathBuf::from(PaymentDataset::ECommerce.default_path())
}
fn default_topology_path() -> PathBuf {
    PathBuf::from("topologies/topology.txt")
}
fn default_workload_path() -> PathBuf {
    PathBuf::from("workloads/workload.txt")
}
fn default_n_payments() -> usize {
    1
}
fn default_min_payment() -> f64 {
    0.1
}
fn default_max_payment() -> f64 {
    1.0
}
fn default_time_window() -> u64 {
    5000
}

// ============================================================================
// Pipeline Steps
// ============================================================================

fn run_topology(scenario: &TopologyScenario, rng: &mut StdRng) -> Result<(), GenError> {
    let model = match scenario.model {
        ModelKind::ScaleFree => TopologyModel::ScaleFree {
            alpha: scenario.alpha,
            beta: scenario.beta,
            gamma: scenario.gamma,
        },
        ModelKind::WattsStrogatz => TopologyModel::WattsStrogatz {
            k: scenario.k,
            p: scenario.p,
        },
        ModelKind::BarabasiAlbert => TopologyModel::BarabasiAlbert { m: scenario.m },
    };

    let mut graph = synthesize(&model, scenario.nodes, rng)?;
    graph.normalize();

    let populations = if scenario.empirical_channels {
        Some(ChannelPopulations::load(&scenario.channel_stats)?)
    } else {
        None
    };
    let mode = match &populations {
        Some(populations) => AttributeMode::Empirical(populations),
        None => AttributeMode::Synthetic,
    };
    assign_attributes(&mut graph, mode, CorrelationPolicy::None, rng)?;

    write_topology(&scenario.output, &graph)
}

fn run_workload(scenario: &WorkloadScenario, rng: &mut StdRng) -> Result<(), GenError> {
    let graph = load_topology(&scenario.topology)?;
    let mode = if scenario.any_node {
        EndHostMode::AllNodes
    } else {
        EndHostMode::LeavesOnly
    };
    let hosts = end_hosts(&graph, mode)?;

    let options = AmountOptions {
        min_payment: scenario.min_payment,
        max_payment: scenario.max_payment,
        credit_card: scenario.credit_card,
        e_commerce: scenario.e_commerce,
        credit_card_path: scenario.credit_card_path.clone(),
        e_commerce_path: scenario.e_commerce_path.clone(),
    };
    let amounts = resolve_amount_source(&options, scenario.n_payments, rng)?;

    let payments = generate_workload(
        scenario.n_payments,
        amounts,
        &hosts,
        scenario.time_window,
        rng,
    )?;

    write_workload(&scenario.output, &payments)
}

// ============================================================================
// Entry Point
// ============================================================================

fn main() {
    SimpleLogger::new().init().unwrap();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <scenario.yaml> [--seed SEED_HEX]", args[0]);
        eprintln!("\nExamples:");
        eprintln!("  {} scenarios/scale-free.yaml", args[0]);
        eprintln!("  {} scenarios/lightning.yaml --seed 0x123456...", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);

    let seed: [u8; 32] = if args.len() >= 4 && args[2] == "--seed" {
        parse_seed_hex(&args[3])
    } else {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill(&mut seed);
        seed
    };

    let yaml_content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path.display(), e);
        process::exit(1);
    });

    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", path.display(), e);
        process::exit(1);
    });

    if scenario.topology.is_none() && scenario.workload.is_none() {
        eprintln!(
            "Error: {} has neither a topology nor a workload section",
            path.display()
        );
        process::exit(1);
    }

    if let Some(ref name) = scenario.meta.name {
        info!("scenario: {}", name);
    }
    if let Some(ref description) = scenario.meta.description {
        info!("{}", description);
    }
    // echo the seed so any run can be replayed with --seed
    info!("let seed = {:?};", seed);

    let mut rng = StdRng::from_seed(seed);

    if let Some(ref topology) = scenario.topology {
        if let Err(e) = run_topology(topology, &mut rng) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    if let Some(ref workload) = scenario.workload {
        if let Err(e) = run_workload(workload, &mut rng) {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }

    info!("done");
}

fn parse_seed_hex(hex: &str) -> [u8; 32] {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte_str = std::str::from_utf8(chunk).unwrap_or_else(|e| {
            eprintln!("Invalid hex seed: {}", e);
            process::exit(1);
        });
        seed[i] = u8::from_str_radix(byte_str, 16).unwrap_or_else(|e| {
            eprintln!("Invalid hex seed: {}", e);
            process::exit(1);
        });
    }

    seed
}

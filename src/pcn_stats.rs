// Statistical data adapter: empirical channel statistics, payment-amount
// datasets, subsampling, and currency conversion

use std::fs;
use std::path::Path;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::pcn_interface::GenError;

/// Fixed BTC -> EUR rate used to re-denominate channel statistics.
pub const BITCOIN_TO_EURO_EXCHANGE: f64 = 43037.31;

/// Channel statistics are denominated in satoshis.
pub const SATOSHIS_PER_BITCOIN: f64 = 1e8;

/// Sentinel marking an absent value in the channel statistics source.
const NULL_MARKER: &str = "null";

// ============================================================================
// Channel Statistics Source
// ============================================================================

/// Extracts every value of `field` from a `"<key>: <value>"`-shaped dump.
///
/// Matching is by substring, as the source lines carry surrounding
/// formatting (quotes, commas) which is stripped before coercion. `null`
/// entries are excluded.
pub fn channel_stat_values(content: &str, field: &str) -> Result<Vec<i64>, GenError> {
    let mut values = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if !line.contains(field) {
            continue;
        }
        let raw = line
            .splitn(2, ':')
            .nth(1)
            .ok_or_else(|| GenError::Parse {
                line: idx + 1,
                message: format!("expected '{}: <value>'", field),
            })?;
        let cleaned: String = raw
            .chars()
            .filter(|c| !matches!(c, ' ' | ',' | '"' | '\r'))
            .collect();
        if cleaned == NULL_MARKER {
            continue;
        }
        let value = cleaned.parse::<i64>().map_err(|_| GenError::Parse {
            line: idx + 1,
            message: format!("'{}' is not an integer {} value", cleaned, field),
        })?;
        values.push(value);
    }

    Ok(values)
}

/// Populations backing the empirically assigned channel attributes.
#[derive(Debug, Clone)]
pub struct ChannelPopulations {
    pub capacities: Vec<i64>,
    pub fee_bases: Vec<i64>,
    pub min_htlcs: Vec<i64>,
}

impl ChannelPopulations {
    pub const CAPACITY_FIELD: &'static str = "capacity";
    pub const FEE_BASE_FIELD: &'static str = "fee_base_msat";
    pub const MIN_HTLC_FIELD: &'static str = "min_htlc";

    pub fn parse(content: &str) -> Result<Self, GenError> {
        Ok(Self {
            capacities: channel_stat_values(content, Self::CAPACITY_FIELD)?,
            fee_bases: channel_stat_values(content, Self::FEE_BASE_FIELD)?,
            min_htlcs: channel_stat_values(content, Self::MIN_HTLC_FIELD)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, GenError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }
}

// ============================================================================
// Descriptive Statistics
// ============================================================================

/// Descriptive statistics of one extracted field. Diagnostics only: nothing
/// downstream consumes these.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    pub mean: f64,
    pub max: i64,
    pub min: i64,
    /// Sample standard deviation (ddof = 1); NaN below 2 values.
    pub std_dev: f64,
    pub variance: f64,
}

impl FieldSummary {
    pub fn of(values: &[i64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
        let variance = if values.len() < 2 {
            f64::NAN
        } else {
            values
                .iter()
                .map(|v| (*v as f64 - mean).powi(2))
                .sum::<f64>()
                / (n - 1.0)
        };
        Some(Self {
            mean,
            max: *values.iter().max().unwrap_or(&0),
            min: *values.iter().min().unwrap_or(&0),
            std_dev: variance.sqrt(),
            variance,
        })
    }

    pub fn log(&self, field: &str) {
        info!(
            "statistics for {}: mean {:.2} max {} min {} std {:.2} var {:.2}",
            field, self.mean, self.max, self.min, self.std_dev, self.variance
        );
    }
}

// ============================================================================
// Subsampling
// ============================================================================

/// Values drawn without replacement, tagged with the seed of the draw that
/// selected them so a run can be replayed.
#[derive(Debug, Clone)]
pub struct EmpiricalSample<T> {
    pub values: Vec<T>,
    pub draw_seed: u64,
}

impl<T> EmpiricalSample<T> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn pop(&mut self) -> Option<T> {
        self.values.pop()
    }
}

/// Draws `n` values without replacement from `population`.
///
/// The draw seed comes from the caller's RNG rather than an ambient random
/// source, so a run seeded at the top level reproduces its samples.
pub fn sample_without_replacement<T: Copy>(
    population: &[T],
    n: usize,
    field: &str,
    rng: &mut StdRng,
) -> Result<EmpiricalSample<T>, GenError> {
    if n > population.len() {
        return Err(GenError::InsufficientPopulation {
            field: field.to_string(),
            requested: n,
            available: population.len(),
        });
    }

    let draw_seed: u64 = rng.gen();
    let mut draw_rng = StdRng::seed_from_u64(draw_seed);
    let values = rand::seq::index::sample(&mut draw_rng, population.len(), n)
        .iter()
        .map(|i| population[i])
        .collect();

    debug!("drew {} values for '{}' with draw seed {}", n, field, draw_seed);

    Ok(EmpiricalSample { values, draw_seed })
}

/// Converts a satoshi-denominated value to euros.
pub fn satoshis_to_euro(value: f64) -> f64 {
    value / SATOSHIS_PER_BITCOIN * BITCOIN_TO_EURO_EXCHANGE
}

// ============================================================================
// Payment-Amount Datasets
// ============================================================================

/// Tabular datasets that can drive payment amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDataset {
    CreditCard,
    ECommerce,
}

impl PaymentDataset {
    pub fn name(&self) -> &'static str {
        match self {
            PaymentDataset::CreditCard => "credit-card",
            PaymentDataset::ECommerce => "e-commerce",
        }
    }

    /// Column holding the payment amount.
    pub fn amount_column(&self) -> &'static str {
        match self {
            PaymentDataset::CreditCard => "Amount",
            PaymentDataset::ECommerce => "UnitPrice",
        }
    }

    pub fn default_path(&self) -> &'static str {
        match self {
            PaymentDataset::CreditCard => "datasets/creditcard.csv",
            PaymentDataset::ECommerce => "datasets/data.csv",
        }
    }
}

/// Extracts the strictly positive values of `column` from a CSV dataset.
///
/// Rows whose field is empty, non-numeric, or not positive are excluded
/// before sampling, mirroring the positivity filter the workload applies to
/// the source data.
pub fn dataset_amounts(content: &str, column: &str) -> Result<Vec<f64>, GenError> {
    let mut lines = content.lines();
    let header = lines.next().ok_or_else(|| GenError::Parse {
        line: 1,
        message: "dataset is empty".to_string(),
    })?;

    let column_index = split_csv_fields(header)
        .iter()
        .position(|name| name == column)
        .ok_or_else(|| GenError::Parse {
            line: 1,
            message: format!("column '{}' not found in dataset header", column),
        })?;

    let mut amounts = Vec::new();
    for line in lines {
        let fields = split_csv_fields(line);
        let Some(field) = fields.get(column_index) else {
            continue;
        };
        if let Ok(value) = field.parse::<f64>() {
            if value > 0.0 {
                amounts.push(value);
            }
        }
    }

    Ok(amounts)
}

/// Splits one CSV line, honoring double-quoted fields (the e-commerce
/// dataset quotes descriptions containing commas).
fn split_csv_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            '\r' => {}
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNELS: &str = "\
\"capacity\": 100000,
\"fee_base_msat\": 1000,
\"capacity\": null,
\"capacity\": 250000,
\"min_htlc\": 1,
\"fee_base_msat\": 500,
\"capacity\": 50000,
";

    fn rng() -> StdRng {
        StdRng::from_seed([0u8; 32])
    }

    #[test]
    fn test_channel_stat_values_extracts_and_strips() {
        let values = channel_stat_values(CHANNELS, "capacity").unwrap();
        assert_eq!(values, vec![100000, 250000, 50000]);
    }

    #[test]
    fn test_channel_stat_values_skips_null_marker() {
        let values = channel_stat_values(CHANNELS, "capacity").unwrap();
        assert!(!values.iter().any(|v| *v == 0));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_channel_stat_values_rejects_garbage() {
        let result = channel_stat_values("\"capacity\": not-a-number,\n", "capacity");
        assert!(matches!(result, Err(GenError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_channel_populations_parse() {
        let populations = ChannelPopulations::parse(CHANNELS).unwrap();
        assert_eq!(populations.capacities.len(), 3);
        assert_eq!(populations.fee_bases, vec![1000, 500]);
        assert_eq!(populations.min_htlcs, vec![1]);
    }

    #[test]
    fn test_field_summary() {
        let summary = FieldSummary::of(&[2, 4, 6]).unwrap();
        assert!((summary.mean - 4.0).abs() < 1e-12);
        assert_eq!(summary.max, 6);
        assert_eq!(summary.min, 2);
        // sample variance with ddof = 1
        assert!((summary.variance - 4.0).abs() < 1e-12);
        assert!((summary.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_field_summary_of_empty_is_none() {
        assert!(FieldSummary::of(&[]).is_none());
    }

    #[test]
    fn test_sample_without_replacement_membership() {
        let population: Vec<i64> = (0..100).collect();
        let sample = sample_without_replacement(&population, 10, "capacity", &mut rng()).unwrap();

        assert_eq!(sample.len(), 10);
        let mut seen = std::collections::HashSet::new();
        for value in &sample.values {
            assert!(population.contains(value));
            // without replacement: no duplicates
            assert!(seen.insert(*value));
        }
    }

    #[test]
    fn test_sample_insufficient_population() {
        let population = vec![1.0, 2.0];
        let result = sample_without_replacement(&population, 3, "Amount", &mut rng());

        assert!(matches!(
            result,
            Err(GenError::InsufficientPopulation {
                requested: 3,
                available: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_sampling_is_deterministic_for_a_seed() {
        let population: Vec<i64> = (0..50).collect();
        let a = sample_without_replacement(&population, 20, "capacity", &mut rng()).unwrap();
        let b = sample_without_replacement(&population, 20, "capacity", &mut rng()).unwrap();

        assert_eq!(a.draw_seed, b.draw_seed);
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn test_satoshis_to_euro() {
        let euros = satoshis_to_euro(SATOSHIS_PER_BITCOIN);
        assert!((euros - BITCOIN_TO_EURO_EXCHANGE).abs() < 1e-9);
    }

    #[test]
    fn test_dataset_amounts_filters_nonpositive() {
        let csv = "Time,Amount,Class\n1,10.5,0\n2,0,0\n3,-4.0,1\n4,2.25,0\n";
        let amounts = dataset_amounts(csv, "Amount").unwrap();
        assert_eq!(amounts, vec![10.5, 2.25]);
    }

    #[test]
    fn test_dataset_amounts_skips_blank_and_non_numeric() {
        let csv = "UnitPrice,Country\n2.5,UK\n,UK\nn/a,FR\n1.0,DE\n";
        let amounts = dataset_amounts(csv, "UnitPrice").unwrap();
        assert_eq!(amounts, vec![2.5, 1.0]);
    }

    #[test]
    fn test_dataset_amounts_handles_quoted_commas() {
        let csv = "Description,UnitPrice\n\"BOX, SMALL\",3.75\n\"JAR, RED\",0\n";
        let amounts = dataset_amounts(csv, "UnitPrice").unwrap();
        assert_eq!(amounts, vec![3.75]);
    }

    #[test]
    fn test_dataset_amounts_unknown_column() {
        let result = dataset_amounts("Time,Amount\n1,2\n", "UnitPrice");
        assert!(matches!(result, Err(GenError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_dataset_names_and_columns() {
        assert_eq!(PaymentDataset::CreditCard.amount_column(), "Amount");
        assert_eq!(PaymentDataset::ECommerce.amount_column(), "UnitPrice");
        assert_eq!(PaymentDataset::CreditCard.name(), "credit-card");
    }
}

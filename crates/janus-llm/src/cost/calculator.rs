//! Cost computation
//!
//! Pure functions from (usage, pricing) to a per-category breakdown. All
//! categories are computed at full precision first, then rounded to six
//! decimal places (micro-cent precision) independently; the total is the
//! rounded sum of the rounded categories.

use super::pricing::PricingDescriptor;
use crate::completion::TokenUsage;
use serde::{Deserialize, Serialize};

/// Per-category cost breakdown in USD, six decimal places per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Input token cost (tiered when the descriptor defines tiers)
    pub input_cost: f64,
    /// Output token cost
    pub output_cost: f64,
    /// Cache-creation token cost
    pub cache_creation_cost: f64,
    /// Cache-read token cost
    pub cache_read_cost: f64,
    /// Reasoning token cost (billed at the output rate)
    pub reasoning_cost: f64,
    /// Sum of the rounded categories, rounded
    pub total_cost: f64,
}

/// Round to six decimal places, half-up on the micro-units.
#[must_use]
pub fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Calculate the cost of one exchange.
pub fn calculate_cost(usage: &TokenUsage, pricing: &PricingDescriptor) -> CostBreakdown {
    let input_cost = if pricing.tiers.is_empty() {
        per_million(usage.input_tokens, pricing.input_cost_per_million)
    } else {
        tiered_input_cost(usage.input_tokens, pricing)
    };

    let output_cost = per_million(usage.output_tokens, pricing.output_cost_per_million);
    let cache_creation_cost = per_million(
        usage.cache_creation_tokens,
        pricing.cache_creation_cost_per_million.unwrap_or(0.0),
    );
    let cache_read_cost = per_million(
        usage.cache_read_tokens,
        pricing.cache_read_cost_per_million.unwrap_or(0.0),
    );
    // Vendors do not expose a separate reasoning rate; bill at the output rate.
    let reasoning_cost = per_million(usage.reasoning_tokens, pricing.output_cost_per_million);

    let input_cost = round6(input_cost);
    let output_cost = round6(output_cost);
    let cache_creation_cost = round6(cache_creation_cost);
    let cache_read_cost = round6(cache_read_cost);
    let reasoning_cost = round6(reasoning_cost);

    CostBreakdown {
        input_cost,
        output_cost,
        cache_creation_cost,
        cache_read_cost,
        reasoning_cost,
        total_cost: round6(
            input_cost + output_cost + cache_creation_cost + cache_read_cost + reasoning_cost,
        ),
    }
}

fn per_million(tokens: u64, cost_per_million: f64) -> f64 {
    (tokens as f64 / 1_000_000.0) * cost_per_million
}

/// Bill input tokens across context-length tiers.
///
/// Tiers are applied in ascending `min_tokens` order regardless of input
/// order; a tier covers token positions `[min, max)` and each token is
/// billed exactly once. Positions not covered by any tier fall back to the
/// flat input rate.
fn tiered_input_cost(input_tokens: u64, pricing: &PricingDescriptor) -> f64 {
    let mut tiers = pricing.tiers.clone();
    tiers.sort_by_key(|t| t.min_tokens);

    let mut cost = 0.0;
    let mut covered = 0u64;

    for tier in &tiers {
        let start = tier.min_tokens.max(covered);
        let end = tier.max_tokens.unwrap_or(u64::MAX).min(input_tokens);
        if end <= start {
            continue;
        }

        // Tokens between the previous tier's end and this tier's start are
        // outside every tier; bill them flat.
        if start > covered {
            cost += per_million(start - covered, pricing.input_cost_per_million);
        }

        cost += per_million(end - start, tier.input_cost_per_million);
        covered = end;
        if covered >= input_tokens {
            break;
        }
    }

    if covered < input_tokens {
        cost += per_million(input_tokens - covered, pricing.input_cost_per_million);
    }

    cost
}

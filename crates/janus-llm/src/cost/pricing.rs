//! Model pricing descriptors
//!
//! All rates are USD per one million tokens. Every per-category rate is
//! optional at the descriptor level; an absent rate means the category
//! costs nothing for that model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// 2026 model pricing constants (per 1M tokens, USD)
// ============================================================================

/// Claude Sonnet 4.5 input cost per 1M tokens
pub const CLAUDE_SONNET45_INPUT_COST: f64 = 3.00;
/// Claude Sonnet 4.5 output cost per 1M tokens
pub const CLAUDE_SONNET45_OUTPUT_COST: f64 = 15.00;
/// Claude Opus 4.5 input cost per 1M tokens
pub const CLAUDE_OPUS45_INPUT_COST: f64 = 5.00;
/// Claude Opus 4.5 output cost per 1M tokens
pub const CLAUDE_OPUS45_OUTPUT_COST: f64 = 25.00;
/// Claude Haiku 4.5 input cost per 1M tokens
pub const CLAUDE_HAIKU45_INPUT_COST: f64 = 1.00;
/// Claude Haiku 4.5 output cost per 1M tokens
pub const CLAUDE_HAIKU45_OUTPUT_COST: f64 = 5.00;

/// GPT-5 input cost per 1M tokens
pub const GPT5_INPUT_COST: f64 = 1.25;
/// GPT-5 output cost per 1M tokens
pub const GPT5_OUTPUT_COST: f64 = 10.00;
/// GPT-5 nano input cost per 1M tokens
pub const GPT5_NANO_INPUT_COST: f64 = 0.05;
/// GPT-5 nano output cost per 1M tokens
pub const GPT5_NANO_OUTPUT_COST: f64 = 0.40;

/// Gemini 2.5 Pro input cost per 1M tokens (≤200k context)
pub const GEMINI_PRO_INPUT_COST: f64 = 1.25;
/// Gemini 2.5 Pro input cost per 1M tokens above the 200k context boundary
pub const GEMINI_PRO_INPUT_COST_LONG: f64 = 2.50;
/// Gemini 2.5 Pro output cost per 1M tokens
pub const GEMINI_PRO_OUTPUT_COST: f64 = 15.00;
/// Gemini 2.5 Flash input cost per 1M tokens
pub const GEMINI_FLASH_INPUT_COST: f64 = 0.075;
/// Gemini 2.5 Flash output cost per 1M tokens
pub const GEMINI_FLASH_OUTPUT_COST: f64 = 0.60;

/// Context boundary where long-context input pricing starts
pub const LONG_CONTEXT_BOUNDARY: u64 = 200_000;

// ============================================================================
// Descriptors
// ============================================================================

/// One contiguous input-token range billed at its own rate.
///
/// Boundaries are inclusive of `min_tokens` and exclusive of `max_tokens`;
/// `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    /// First token position covered by this tier
    pub min_tokens: u64,
    /// First token position past this tier, `None` for unbounded
    pub max_tokens: Option<u64>,
    /// Input cost per 1M tokens within this tier
    pub input_cost_per_million: f64,
}

/// Pricing for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingDescriptor {
    /// Flat input cost per 1M tokens (overridden by `tiers` when present)
    pub input_cost_per_million: f64,
    /// Output cost per 1M tokens. Reasoning tokens bill at this rate too,
    /// since vendors do not expose a separate reasoning rate.
    pub output_cost_per_million: f64,
    /// Cache-creation cost per 1M tokens
    #[serde(default)]
    pub cache_creation_cost_per_million: Option<f64>,
    /// Cache-read cost per 1M tokens
    #[serde(default)]
    pub cache_read_cost_per_million: Option<f64>,
    /// Context-length input pricing tiers, applied in ascending `min_tokens`
    /// order
    #[serde(default)]
    pub tiers: Vec<PricingTier>,
}

impl PricingDescriptor {
    /// Flat input/output pricing.
    #[must_use]
    pub fn flat(input_cost_per_million: f64, output_cost_per_million: f64) -> Self {
        Self {
            input_cost_per_million,
            output_cost_per_million,
            ..Default::default()
        }
    }

    /// Set cache rates.
    #[must_use]
    pub fn with_cache_rates(mut self, creation: f64, read: f64) -> Self {
        self.cache_creation_cost_per_million = Some(creation);
        self.cache_read_cost_per_million = Some(read);
        self
    }

    /// Set context-length tiers.
    #[must_use]
    pub fn with_tiers(mut self, tiers: Vec<PricingTier>) -> Self {
        self.tiers = tiers;
        self
    }
}

/// Default pricing for well-known models across the supported vendors.
#[must_use]
pub fn default_pricing() -> HashMap<String, PricingDescriptor> {
    let mut pricing = HashMap::new();

    // ========================================================================
    // Anthropic Claude 4.5 family (cache rates: creation 1.25x, read 0.1x)
    // ========================================================================
    pricing.insert(
        "claude-sonnet-4-5-20250929".to_string(),
        PricingDescriptor::flat(CLAUDE_SONNET45_INPUT_COST, CLAUDE_SONNET45_OUTPUT_COST)
            .with_cache_rates(3.75, 0.30),
    );
    pricing.insert(
        "claude-opus-4-5-20250514".to_string(),
        PricingDescriptor::flat(CLAUDE_OPUS45_INPUT_COST, CLAUDE_OPUS45_OUTPUT_COST)
            .with_cache_rates(6.25, 0.50),
    );
    pricing.insert(
        "claude-haiku-4-5-20251001".to_string(),
        PricingDescriptor::flat(CLAUDE_HAIKU45_INPUT_COST, CLAUDE_HAIKU45_OUTPUT_COST)
            .with_cache_rates(1.25, 0.10),
    );

    // ========================================================================
    // OpenAI GPT-5 family (also used by Azure GPT-5 deployments)
    // ========================================================================
    pricing.insert(
        "gpt-5".to_string(),
        PricingDescriptor::flat(GPT5_INPUT_COST, GPT5_OUTPUT_COST).with_cache_rates(0.0, 0.125),
    );
    pricing.insert(
        "gpt-5-nano".to_string(),
        PricingDescriptor::flat(GPT5_NANO_INPUT_COST, GPT5_NANO_OUTPUT_COST)
            .with_cache_rates(0.0, 0.005),
    );
    pricing.insert(
        "gpt-4o".to_string(),
        PricingDescriptor::flat(2.50, 10.00).with_cache_rates(0.0, 1.25),
    );

    // ========================================================================
    // Google Gemini 2.5 family (Pro doubles input cost past 200k context)
    // ========================================================================
    pricing.insert(
        "gemini-2.5-pro".to_string(),
        PricingDescriptor::flat(GEMINI_PRO_INPUT_COST, GEMINI_PRO_OUTPUT_COST).with_tiers(vec![
            PricingTier {
                min_tokens: 0,
                max_tokens: Some(LONG_CONTEXT_BOUNDARY),
                input_cost_per_million: GEMINI_PRO_INPUT_COST,
            },
            PricingTier {
                min_tokens: LONG_CONTEXT_BOUNDARY,
                max_tokens: None,
                input_cost_per_million: GEMINI_PRO_INPUT_COST_LONG,
            },
        ]),
    );
    pricing.insert(
        "gemini-2.5-flash".to_string(),
        PricingDescriptor::flat(GEMINI_FLASH_INPUT_COST, GEMINI_FLASH_OUTPUT_COST),
    );

    // ========================================================================
    // Local models via Ollama (FREE)
    // ========================================================================
    pricing.insert("qwen2.5:7b".to_string(), PricingDescriptor::flat(0.0, 0.0));
    pricing.insert("llama3.2".to_string(), PricingDescriptor::flat(0.0, 0.0));

    pricing
}

//! Offer acceptance rules.
//!
//! [`evaluate_offer`] is pure: everything it depends on is passed in through
//! [`FilterContext`]. Recording the score and caching the proposal for an
//! accepted offer is left to the caller (`ProbeState::filter_offer`).

use crate::core::cost::estimate_cost;
use crate::core::names::NameLists;
use crate::core::scoring::score;
use crate::core::types::{Offer, PriceLimits, Workload};

/// Inputs to an offer decision.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub names: &'a NameLists,
    pub limits: &'a PriceLimits,
    pub workload: &'a Workload,
}

/// Why an offer was rejected. Variants are listed in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    NotWhitelisted,
    Blacklisted,
    /// A negative or non-finite pricing coefficient.
    InvalidPricing,
    PriceLimit,
    EstimateLimit { estimate: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterDecision {
    Accept { estimate: f64, score: f64 },
    Reject(RejectReason),
}

impl FilterDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, FilterDecision::Accept { .. })
    }
}

/// Decide whether `offer` is acceptable, short-circuiting on the first failed gate.
///
/// Gates, in order: whitelist membership (whitelist mode only), blacklist
/// membership, pricing sanity, per-coefficient price ceilings, estimated task
/// cost ceiling.
pub fn evaluate_offer(ctx: &FilterContext<'_>, offer: &Offer) -> FilterDecision {
    let name = offer.provider.name.as_str();

    if ctx.names.whitelist_used() && !ctx.names.is_whitelisted(name) {
        return FilterDecision::Reject(RejectReason::NotWhitelisted);
    }
    if ctx.names.is_blacklisted(name) {
        return FilterDecision::Reject(RejectReason::Blacklisted);
    }
    if !has_valid_pricing(offer) {
        return FilterDecision::Reject(RejectReason::InvalidPricing);
    }
    if !within_price_limits(offer, ctx.limits) {
        return FilterDecision::Reject(RejectReason::PriceLimit);
    }

    let estimate = estimate_cost(offer, ctx.workload);
    if estimate > ctx.limits.estimate {
        return FilterDecision::Reject(RejectReason::EstimateLimit { estimate });
    }

    FilterDecision::Accept {
        estimate,
        score: score(estimate),
    }
}

fn has_valid_pricing(offer: &Offer) -> bool {
    let pricing = &offer.pricing;
    [pricing.start, pricing.cpu_per_sec, pricing.env_per_sec]
        .iter()
        .all(|price| price.is_finite() && *price >= 0.0)
}

fn within_price_limits(offer: &Offer, limits: &PriceLimits) -> bool {
    let pricing = &offer.pricing;
    pricing.start <= limits.start
        && pricing.cpu_per_sec <= limits.cpu_per_sec
        && pricing.env_per_sec <= limits.env_per_sec
}

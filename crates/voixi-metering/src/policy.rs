//! Tier Policy Resolver
//!
//! Maps an account to its subscription tier and the tier to its ceiling.
//! Until accounts are provisioned from a billing system, the tier is derived
//! from the dialled number: explicit overrides first, then suffix rules, and the
//! most restrictive tier for everything else.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use voixi_common::{AccountId, Ceiling, MeteringError, Tier, BASIC_TIER_CEILING};

/// Source of tier assignments
pub trait TierResolver: Send + Sync {
    /// Tier for an account; lookups backed by a remote store may fail
    fn resolve(&self, account: &AccountId) -> Result<Tier, MeteringError>;

    /// Ceiling for a tier
    fn ceiling(&self, tier: Tier) -> Ceiling;
}

/// Ceiling per tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierCeilings {
    pub basic: Ceiling,
    pub growth: Ceiling,
    pub enterprise: Ceiling,
}

impl Default for TierCeilings {
    fn default() -> Self {
        Self {
            basic: Ceiling::Limited(BASIC_TIER_CEILING),
            growth: Ceiling::Unlimited,
            enterprise: Ceiling::Unlimited,
        }
    }
}

impl TierCeilings {
    pub fn get(&self, tier: Tier) -> Ceiling {
        match tier {
            Tier::Basic => self.basic,
            Tier::Growth => self.growth,
            Tier::Enterprise => self.enterprise,
        }
    }
}

/// Suffix rule: accounts ending in `suffix` get `tier`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRule {
    pub suffix: String,
    pub tier: Tier,
}

/// Policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub ceilings: TierCeilings,
    /// Explicit assignments, checked before suffix rules
    pub tier_overrides: HashMap<String, Tier>,
    pub suffix_rules: Vec<SuffixRule>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            ceilings: TierCeilings::default(),
            tier_overrides: HashMap::new(),
            suffix_rules: vec![
                SuffixRule {
                    suffix: "9999".into(),
                    tier: Tier::Enterprise,
                },
                SuffixRule {
                    suffix: "8888".into(),
                    tier: Tier::Growth,
                },
            ],
        }
    }
}

/// Deterministic, infallible tier policy
#[derive(Debug, Clone)]
pub struct TierPolicy {
    ceilings: TierCeilings,
    overrides: HashMap<AccountId, Tier>,
    suffix_rules: Vec<SuffixRule>,
}

impl TierPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        let overrides = config
            .tier_overrides
            .into_iter()
            .filter_map(|(raw, tier)| AccountId::parse(Some(&raw)).ok().map(|id| (id, tier)))
            .collect();

        Self {
            ceilings: config.ceilings,
            overrides,
            suffix_rules: config.suffix_rules,
        }
    }

    /// Assign a tier to one account
    pub fn with_override(mut self, account: AccountId, tier: Tier) -> Self {
        self.overrides.insert(account, tier);
        self
    }

    pub fn ceilings(&self) -> &TierCeilings {
        &self.ceilings
    }

    /// Total lookup: unknown accounts get the most restrictive tier
    pub fn tier_for(&self, account: &AccountId) -> Tier {
        if let Some(tier) = self.overrides.get(account) {
            return *tier;
        }
        self.suffix_rules
            .iter()
            .find(|rule| !rule.suffix.is_empty() && account.as_str().ends_with(&rule.suffix))
            .map(|rule| rule.tier)
            .unwrap_or_else(Tier::most_restrictive)
    }
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

impl TierResolver for TierPolicy {
    fn resolve(&self, account: &AccountId) -> Result<Tier, MeteringError> {
        Ok(self.tier_for(account))
    }

    fn ceiling(&self, tier: Tier) -> Ceiling {
        self.ceilings.get(tier)
    }
}

//! Subscription tiers and their usage ceilings
//!
//! A ceiling is either a finite number of admitted events per billing period or
//! unlimited. Configuration files spell unlimited as the string `"unlimited"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Subscription level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Entry plan, metered
    Basic,
    /// Mid plan, unlimited calls
    Growth,
    /// Top plan, unlimited calls
    Enterprise,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Basic, Tier::Growth, Tier::Enterprise];

    /// Tier assigned when an account cannot be classified
    pub fn most_restrictive() -> Self {
        Tier::Basic
    }
}

impl Default for Tier {
    fn default() -> Self {
        Tier::most_restrictive()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Basic => write!(f, "basic"),
            Tier::Growth => write!(f, "growth"),
            Tier::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// Maximum admitted events per period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ceiling {
    Limited(u64),
    Unlimited,
}

impl Ceiling {
    /// Finite limit, if any
    pub fn limit(&self) -> Option<u64> {
        match self {
            Ceiling::Limited(n) => Some(*n),
            Ceiling::Unlimited => None,
        }
    }

    /// Whether one more event may be admitted at the given usage
    pub fn permits(&self, usage: u64) -> bool {
        match self {
            Ceiling::Limited(n) => usage < *n,
            Ceiling::Unlimited => true,
        }
    }

    /// Events left in the period; `None` when unlimited
    pub fn remaining(&self, usage: u64) -> Option<u64> {
        self.limit().map(|n| n.saturating_sub(usage))
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Ceiling::Unlimited)
    }
}

impl fmt::Display for Ceiling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ceiling::Limited(n) => write!(f, "{}", n),
            Ceiling::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl Serialize for Ceiling {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ceiling::Limited(n) => serializer.serialize_u64(*n),
            Ceiling::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl<'de> Deserialize<'de> for Ceiling {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(u64),
            Word(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Ceiling::Limited(n)),
            Raw::Word(w) if w.eq_ignore_ascii_case("unlimited") => Ok(Ceiling::Unlimited),
            Raw::Word(w) => w.trim().parse::<u64>().map(Ceiling::Limited).map_err(|_| {
                serde::de::Error::custom(format!(
                    "invalid ceiling {:?}: expected a count or \"unlimited\"",
                    w
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limited_permits_below_ceiling_only() {
        let ceiling = Ceiling::Limited(500);
        assert!(ceiling.permits(0));
        assert!(ceiling.permits(499));
        assert!(!ceiling.permits(500));
        assert!(!ceiling.permits(501));
        assert_eq!(ceiling.remaining(120), Some(380));
        assert_eq!(ceiling.remaining(600), Some(0));
    }

    #[test]
    fn test_unlimited_always_permits() {
        assert!(Ceiling::Unlimited.permits(u64::MAX));
        assert_eq!(Ceiling::Unlimited.remaining(10), None);
    }

    #[test]
    fn test_ceiling_serde() {
        assert_eq!(serde_json::to_string(&Ceiling::Limited(300)).unwrap(), "300");
        assert_eq!(serde_json::to_string(&Ceiling::Unlimited).unwrap(), "\"unlimited\"");

        let parsed: Ceiling = serde_json::from_str("\"Unlimited\"").unwrap();
        assert_eq!(parsed, Ceiling::Unlimited);
        let parsed: Ceiling = serde_json::from_str("\"1000\"").unwrap();
        assert_eq!(parsed, Ceiling::Limited(1000));
        assert!(serde_json::from_str::<Ceiling>("\"lots\"").is_err());
    }

    #[test]
    fn test_default_tier_is_most_restrictive() {
        assert_eq!(Tier::default(), Tier::Basic);
    }
}

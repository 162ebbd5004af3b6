//! Enumerations shared by requests, the orchestrator and the API client.

use serde::{Deserialize, Serialize};

use super::budget::Budget;

/// How creatives are fanned out into ad sets, and where the budget lives.
///
/// - `Abo`: one shared ad set per campaign carrying the daily budget.
/// - `Cbo`: one shared ad set; the budget is pooled on the campaign.
/// - `PerCreativeTest`: one ad set per creative, each with the full budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FanoutStrategy {
    Abo,
    Cbo,
    #[serde(alias = "TEST")]
    PerCreativeTest,
}

impl FanoutStrategy {
    /// Short tag used in campaign names.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Abo => "ABO",
            Self::Cbo => "CBO",
            Self::PerCreativeTest => "TEST",
        }
    }

    /// Budget attached to the campaign, if the strategy pools it there.
    #[must_use]
    pub const fn campaign_budget(self, budget: Budget) -> Option<Budget> {
        match self {
            Self::Cbo => Some(budget),
            Self::Abo | Self::PerCreativeTest => None,
        }
    }

    /// Budget attached to each ad set, if the strategy budgets per ad set.
    ///
    /// Under `PerCreativeTest` this is a per-creative budget since every
    /// creative gets its own ad set.
    #[must_use]
    pub const fn ad_set_budget(self, budget: Budget) -> Option<Budget> {
        match self {
            Self::Abo | Self::PerCreativeTest => Some(budget),
            Self::Cbo => None,
        }
    }

    /// Whether each creative gets a dedicated ad set.
    #[must_use]
    pub const fn ad_set_per_creative(self) -> bool {
        matches!(self, Self::PerCreativeTest)
    }

    /// Number of ad sets created under one campaign for `creatives` creatives.
    #[must_use]
    pub const fn ad_sets_per_campaign(self, creatives: usize) -> usize {
        if self.ad_set_per_creative() {
            creatives
        } else {
            1
        }
    }
}

impl std::fmt::Display for FanoutStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for FanoutStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ABO" => Ok(Self::Abo),
            "CBO" => Ok(Self::Cbo),
            "TEST" | "PER_CREATIVE_TEST" => Ok(Self::PerCreativeTest),
            _ => Err(format!("invalid fan-out strategy: {s}")),
        }
    }
}

/// Audience gender restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    All,
    Male,
    Female,
}

impl Gender {
    /// Platform gender code, or `None` when the audience is unrestricted.
    #[must_use]
    pub const fn platform_code(self) -> Option<u8> {
        match self {
            Self::All => None,
            Self::Male => Some(1),
            Self::Female => Some(2),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            _ => Err(format!("invalid gender filter: {s}")),
        }
    }
}

/// Call-to-action button shown on the ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallToAction {
    #[default]
    OrderNow,
    ShopNow,
    BuyNow,
    LearnMore,
}

impl CallToAction {
    /// The platform's call-to-action type string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrderNow => "ORDER_NOW",
            Self::ShopNow => "SHOP_NOW",
            Self::BuyNow => "BUY_NOW",
            Self::LearnMore => "LEARN_MORE",
        }
    }
}

/// Broad media category of a creative asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget() -> Budget {
        Budget::new(40_000).expect("non-zero")
    }

    #[test]
    fn test_cbo_pools_budget_on_campaign() {
        assert_eq!(FanoutStrategy::Cbo.campaign_budget(budget()), Some(budget()));
        assert_eq!(FanoutStrategy::Cbo.ad_set_budget(budget()), None);
    }

    #[test]
    fn test_abo_and_test_budget_ad_sets() {
        for strategy in [FanoutStrategy::Abo, FanoutStrategy::PerCreativeTest] {
            assert_eq!(strategy.campaign_budget(budget()), None);
            assert_eq!(strategy.ad_set_budget(budget()), Some(budget()));
        }
    }

    #[test]
    fn test_ad_sets_per_campaign() {
        assert_eq!(FanoutStrategy::Abo.ad_sets_per_campaign(4), 1);
        assert_eq!(FanoutStrategy::Cbo.ad_sets_per_campaign(4), 1);
        assert_eq!(FanoutStrategy::PerCreativeTest.ad_sets_per_campaign(4), 4);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("abo".parse::<FanoutStrategy>(), Ok(FanoutStrategy::Abo));
        assert_eq!(
            "test".parse::<FanoutStrategy>(),
            Ok(FanoutStrategy::PerCreativeTest)
        );
        assert!("dynamic".parse::<FanoutStrategy>().is_err());

        let strategy: FanoutStrategy = serde_json::from_str("\"TEST\"").expect("alias");
        assert_eq!(strategy, FanoutStrategy::PerCreativeTest);
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(Gender::All.platform_code(), None);
        assert_eq!(Gender::Male.platform_code(), Some(1));
        assert_eq!(Gender::Female.platform_code(), Some(2));
    }

    #[test]
    fn test_call_to_action_serde_matches_platform() {
        for cta in [
            CallToAction::OrderNow,
            CallToAction::ShopNow,
            CallToAction::BuyNow,
            CallToAction::LearnMore,
        ] {
            let json = serde_json::to_string(&cta).expect("serialize");
            assert_eq!(json, format!("\"{}\"", cta.as_str()));
        }
    }
}

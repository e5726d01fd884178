use serde::{Deserialize, Serialize};

pub const ELITE_MIN: u32 = 85;
pub const EXCELLENT_MIN: u32 = 75;
pub const GOOD_MIN: u32 = 68;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Elite,
    Excellent,
    Good,
    Poor,
}

/// elite ≥85, excellent 75–84, good 68–74, poor <68
pub fn tier_for_percentage(percentage: u32) -> QualityTier {
    match percentage {
        p if p >= ELITE_MIN => QualityTier::Elite,
        p if p >= EXCELLENT_MIN => QualityTier::Excellent,
        p if p >= GOOD_MIN => QualityTier::Good,
        _ => QualityTier::Poor,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub elite: usize,
    pub excellent: usize,
    pub good: usize,
    pub poor: usize,
}

impl TierCounts {
    pub fn record(&mut self, tier: QualityTier) {
        match tier {
            QualityTier::Elite => self.elite += 1,
            QualityTier::Excellent => self.excellent += 1,
            QualityTier::Good => self.good += 1,
            QualityTier::Poor => self.poor += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.elite + self.excellent + self.good + self.poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(tier_for_percentage(100), QualityTier::Elite);
        assert_eq!(tier_for_percentage(85), QualityTier::Elite);
        assert_eq!(tier_for_percentage(84), QualityTier::Excellent);
        assert_eq!(tier_for_percentage(75), QualityTier::Excellent);
        assert_eq!(tier_for_percentage(74), QualityTier::Good);
        assert_eq!(tier_for_percentage(68), QualityTier::Good);
        assert_eq!(tier_for_percentage(67), QualityTier::Poor);
        assert_eq!(tier_for_percentage(0), QualityTier::Poor);
    }

    #[test]
    fn test_tier_counts() {
        let mut counts = TierCounts::default();
        for p in [90, 80, 70, 10, 12] {
            counts.record(tier_for_percentage(p));
        }
        assert_eq!(counts.elite, 1);
        assert_eq!(counts.excellent, 1);
        assert_eq!(counts.good, 1);
        assert_eq!(counts.poor, 2);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        let json = serde_json::to_string(&QualityTier::Excellent).unwrap();
        assert_eq!(json, "\"excellent\"");
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EcoBand {
    Low,
    Medium,
    High,
}

impl EcoBand {
    /// `<40 low`, `<70 medium`, otherwise `high`.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=39 => Self::Low,
            40..=69 => Self::Medium,
            _ => Self::High,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EcoMetrics {
    pub eco_score: u8,
    pub band: EcoBand,
    pub co2_per_km_grams: f64,
    pub co2_total_grams: f64,
    pub trees_equivalent: f64,
    /// Negative when the trip emits more than the SUV baseline.
    pub savings_vs_baseline_grams: f64,
    pub is_eco_friendly: bool,
}

#[cfg(test)]
mod tests {
    use super::EcoBand;

    #[test]
    fn eco_bands() {
        assert_eq!(EcoBand::from_score(0), EcoBand::Low);
        assert_eq!(EcoBand::from_score(39), EcoBand::Low);
        assert_eq!(EcoBand::from_score(40), EcoBand::Medium);
        assert_eq!(EcoBand::from_score(70), EcoBand::High);
    }
}

use crate::domain::eco::{EcoBand, EcoMetrics};
use crate::domain::trip::VehicleClass;
use crate::errors::DomainError;

/// Average tree absorbs roughly 21 kg of CO2 per year.
pub const GRAMS_ABSORBED_PER_TREE_PER_YEAR: f64 = 21_000.0;
pub const BASELINE_CLASS: VehicleClass = VehicleClass::Suv;
/// Trip length at which the dirtiest class reaches the score floor.
pub const SCORE_REFERENCE_KM: f64 = 5.0;

const SCORE_CEILING: f64 = 100.0;
const SCORE_SPAN: f64 = 80.0;

pub fn co2_per_km(class: VehicleClass) -> f64 {
    match class {
        VehicleClass::Sedan => 120.0,
        VehicleClass::Suv => 180.0,
        VehicleClass::Electric => 30.0,
        VehicleClass::Luxury => 220.0,
    }
}

pub fn dirtiest_co2_per_km() -> f64 {
    VehicleClass::ALL.into_iter().map(co2_per_km).fold(0.0, f64::max)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EcoScorer;

impl EcoScorer {
    pub fn score(&self, class: VehicleClass, distance_km: f64) -> Result<EcoMetrics, DomainError> {
        score_trip(class, distance_km)
    }
}

/// Eco score in `0..=100`.
///
/// Total emissions are normalised against the dirtiest class driven
/// [`SCORE_REFERENCE_KM`] and mapped onto `100 - 80 * min(1, ratio)`, so the
/// score depends on `co2_total_grams` alone and bottoms out at 20. More CO2
/// never scores higher, whatever the class or distance.
pub fn score_trip(class: VehicleClass, distance_km: f64) -> Result<EcoMetrics, DomainError> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(DomainError::invalid_input(
            "distance_km",
            "distance_km must be a finite, non-negative number",
        ));
    }

    let per_km = co2_per_km(class);
    let co2_total_grams = per_km * distance_km;
    let baseline = co2_per_km(BASELINE_CLASS) * distance_km;

    let ratio = (co2_total_grams / (dirtiest_co2_per_km() * SCORE_REFERENCE_KM)).min(1.0);
    let eco_score = (SCORE_CEILING - SCORE_SPAN * ratio).clamp(0.0, SCORE_CEILING) as u8;

    Ok(EcoMetrics {
        eco_score,
        band: EcoBand::from_score(eco_score),
        co2_per_km_grams: per_km,
        co2_total_grams,
        trees_equivalent: co2_total_grams / GRAMS_ABSORBED_PER_TREE_PER_YEAR,
        savings_vs_baseline_grams: baseline - co2_total_grams,
        is_eco_friendly: class.is_electric(),
    })
}

#[cfg(test)]
mod tests {
    use super::{co2_per_km, score_trip, EcoScorer};
    use crate::domain::eco::EcoBand;
    use crate::domain::trip::VehicleClass;

    #[test]
    fn electric_is_cleanest_class() {
        let electric = co2_per_km(VehicleClass::Electric);
        for class in VehicleClass::ALL {
            assert!(electric <= co2_per_km(class));
        }
    }

    #[test]
    fn class_scores_at_city_distance() {
        let scorer = EcoScorer;
        let score = |class| scorer.score(class, 5.0).expect("score").eco_score;

        assert_eq!(score(VehicleClass::Electric), 89);
        assert_eq!(score(VehicleClass::Sedan), 56);
        assert_eq!(score(VehicleClass::Suv), 34);
        assert_eq!(score(VehicleClass::Luxury), 20);
    }

    #[test]
    fn score_never_rises_with_emissions() {
        let mut samples = Vec::new();
        for class in VehicleClass::ALL {
            for distance in [0.0, 1.0, 2.5, 5.0, 10.0, 25.0, 30.0, 60.0, 150.0] {
                let metrics = score_trip(class, distance).expect("score");
                samples.push((metrics.co2_total_grams, metrics.eco_score, class, distance));
            }
        }

        for (co2_a, score_a, class_a, distance_a) in &samples {
            for (co2_b, score_b, class_b, distance_b) in &samples {
                if co2_a < co2_b {
                    assert!(score_a >= score_b, "{class_a} {distance_a}km vs {class_b} {distance_b}km");
                }
            }
        }
    }

    #[test]
    fn long_electric_trip_scores_below_shorter_cleaner_total() {
        let electric = score_trip(VehicleClass::Electric, 30.0).expect("electric");
        let sedan = score_trip(VehicleClass::Sedan, 5.0).expect("sedan");

        assert!(electric.co2_total_grams > sedan.co2_total_grams);
        assert!(electric.eco_score <= sedan.eco_score);
    }

    #[test]
    fn savings_are_signed_against_suv_baseline() {
        let luxury = score_trip(VehicleClass::Luxury, 10.0).expect("luxury");
        assert_eq!(luxury.co2_total_grams, 2_200.0);
        assert_eq!(luxury.savings_vs_baseline_grams, -400.0);
        assert_eq!(luxury.band, EcoBand::Low);

        let electric = score_trip(VehicleClass::Electric, 10.0).expect("electric");
        assert_eq!(electric.savings_vs_baseline_grams, 1_500.0);
        assert!((electric.trees_equivalent - 300.0 / 21_000.0).abs() < 1e-12);
        assert!(electric.is_eco_friendly);
        assert_eq!(electric.band, EcoBand::High);
    }

    #[test]
    fn negative_distance_is_rejected() {
        assert!(score_trip(VehicleClass::Sedan, -2.0).is_err());
    }
}

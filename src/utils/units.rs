//! Distance units for the polling log

const METERS_PER_MILE: f64 = 1609.344;
const METERS_PER_KM: f64 = 1000.0;

/// Unit system used for distances and speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitSystem {
    /// Miles and mph
    #[default]
    Imperial,
    /// Kilometres and km/h
    Metric,
}

impl UnitSystem {
    pub fn from_metric_flag(metric: bool) -> Self {
        if metric {
            UnitSystem::Metric
        } else {
            UnitSystem::Imperial
        }
    }

    /// Convert a distance in meters
    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            UnitSystem::Imperial => meters / METERS_PER_MILE,
            UnitSystem::Metric => meters / METERS_PER_KM,
        }
    }

    /// Convert a distance in kilometres
    pub fn from_km(self, km: f64) -> f64 {
        self.from_meters(km * METERS_PER_KM)
    }

    pub fn distance_label(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "mi",
            UnitSystem::Metric => "km",
        }
    }

    pub fn speed_label(self) -> &'static str {
        match self {
            UnitSystem::Imperial => "mph",
            UnitSystem::Metric => "km/h",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(UnitSystem::Imperial, 1609.344, 1.0)]
    #[case(UnitSystem::Metric, 1609.344, 1.609344)]
    #[case(UnitSystem::Metric, 0.0, 0.0)]
    fn test_from_meters(#[case] units: UnitSystem, #[case] meters: f64, #[case] expected: f64) {
        assert!((units.from_meters(meters) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_from_km() {
        assert!((UnitSystem::Metric.from_km(402.0) - 402.0).abs() < 1e-9);
        assert!((UnitSystem::Imperial.from_km(1.609344) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_labels() {
        assert_eq!(UnitSystem::from_metric_flag(true).speed_label(), "km/h");
        assert_eq!(UnitSystem::from_metric_flag(false).distance_label(), "mi");
    }
}

use super::*;

#[test]
fn boundaries_are_closed_on_the_lower_risk_side() {
    assert_eq!(RiskLevel::classify(45.0), RiskLevel::Low);
    assert_eq!(RiskLevel::classify(44.999), RiskLevel::Medium);
    assert_eq!(RiskLevel::classify(30.0), RiskLevel::Medium);
    assert_eq!(RiskLevel::classify(29.999), RiskLevel::High);
}

#[test]
fn extremes() {
    assert_eq!(RiskLevel::classify(100.0), RiskLevel::Low);
    assert_eq!(RiskLevel::classify(0.0), RiskLevel::High);
    assert_eq!(RiskLevel::classify(-1.0), RiskLevel::High);
    assert_eq!(RiskLevel::classify(f64::NAN), RiskLevel::Unknown);
}

#[test]
fn labels_serialize_by_name() {
    assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"Medium\"");
    assert_eq!(RiskLevel::Unknown.to_string(), "Unknown");
}

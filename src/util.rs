//! Small numeric helpers shared by the analysis and forecast paths.

/// Round to one decimal place (percentages, kWh, years)
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to two decimal places (confidence scores, annual rates)
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

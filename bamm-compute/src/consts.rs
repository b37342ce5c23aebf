//! Physical constants used by battery models.

/// The molar gas constant, in J.K-1.mol-1.
pub const GAS_CONSTANT: f64 = 8.314462618;

/// The Faraday constant, in C.mol-1.
pub const FARADAY: f64 = 96485.33212;

/// The thermal voltage `RT/F` at the given temperature, in V.
pub fn thermal_voltage(temperature: f64) -> f64 {
    GAS_CONSTANT * temperature / FARADAY
}

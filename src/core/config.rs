use crate::types::{SarError, SarResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Strategy used to locate the zero-Doppler time of a ground point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ZeroDopplerMethod {
    /// Bracket the Doppler zero crossing and halve the bracket
    Bisection,
    /// Newton iteration with a finite-difference derivative
    Newton,
}

impl Default for ZeroDopplerMethod {
    fn default() -> Self {
        ZeroDopplerMethod::Bisection
    }
}

impl std::fmt::Display for ZeroDopplerMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZeroDopplerMethod::Bisection => write!(f, "bisection"),
            ZeroDopplerMethod::Newton => write!(f, "newton"),
        }
    }
}

impl std::str::FromStr for ZeroDopplerMethod {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bisection" => Ok(ZeroDopplerMethod::Bisection),
            "newton" => Ok(ZeroDopplerMethod::Newton),
            other => Err(SarError::InvalidConfig(format!(
                "Unknown zero-Doppler method: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ZeroDopplerMethod {
    type Error = SarError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ZeroDopplerMethod> for String {
    fn from(method: ZeroDopplerMethod) -> Self {
        method.to_string()
    }
}

/// Numerical settings shared by the geocoding components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Number of state vectors in the Lagrange interpolation window
    pub interpolation_window: usize,
    /// Doppler magnitude (Hz) below which a bracket endpoint is accepted as-is
    pub doppler_threshold_hz: f64,
    /// Newton stops once |f| falls to this value (Hz)
    pub newton_tolerance_hz: f64,
    /// Newton iteration cap; hitting it returns the best estimate
    pub newton_max_iterations: usize,
    /// Maximum number of memoized orbit interpolations
    pub orbit_cache_capacity: usize,
    /// Edge length of the DEM neighborhood used for surface normals (odd)
    pub incidence_neighborhood: usize,
    /// Zero-Doppler search strategy
    pub zero_doppler_method: ZeroDopplerMethod,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            interpolation_window: 8,
            doppler_threshold_hz: 1.0,
            newton_tolerance_hz: 0.001,
            newton_max_iterations: 10,
            orbit_cache_capacity: 1 << 16,
            incidence_neighborhood: 3,
            zero_doppler_method: ZeroDopplerMethod::Bisection,
        }
    }
}

impl GeocodingConfig {
    /// Parse a configuration document. Missing elements keep their defaults.
    ///
    /// ```xml
    /// <geocoding>
    ///   <interpolation_window>8</interpolation_window>
    ///   <zero_doppler_method>newton</zero_doppler_method>
    /// </geocoding>
    /// ```
    pub fn from_xml_str(xml: &str) -> SarResult<Self> {
        let config: GeocodingConfig = quick_xml::de::from_str(xml)
            .map_err(|e| SarError::XmlParsing(format!("Failed to parse geocoding config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a configuration file
    pub fn from_xml_file<P: AsRef<Path>>(path: P) -> SarResult<Self> {
        log::info!("Reading geocoding config: {}", path.as_ref().display());
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_xml_str(&content)
    }

    /// Reject settings the solvers cannot work with
    pub fn validate(&self) -> SarResult<()> {
        if self.interpolation_window < 2 {
            return Err(SarError::InvalidConfig(format!(
                "interpolation_window must be at least 2, got {}",
                self.interpolation_window
            )));
        }
        if !(self.doppler_threshold_hz >= 0.0) {
            return Err(SarError::InvalidConfig(format!(
                "doppler_threshold_hz must be non-negative, got {}",
                self.doppler_threshold_hz
            )));
        }
        if !(self.newton_tolerance_hz > 0.0) {
            return Err(SarError::InvalidConfig(format!(
                "newton_tolerance_hz must be positive, got {}",
                self.newton_tolerance_hz
            )));
        }
        if self.newton_max_iterations == 0 {
            return Err(SarError::InvalidConfig(
                "newton_max_iterations must be at least 1".to_string(),
            ));
        }
        if self.incidence_neighborhood < 3 || self.incidence_neighborhood % 2 == 0 {
            return Err(SarError::InvalidConfig(format!(
                "incidence_neighborhood must be odd and >= 3, got {}",
                self.incidence_neighborhood
            )));
        }
        Ok(())
    }
}

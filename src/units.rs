//! Unit resolution and conversion
//!
//! Data sources store values in the unit a series was created with. Requests
//! ask for `SI`, `EN` or a named unit; these helpers pick the default unit of
//! the series' base parameter and convert stored values into it.

use crate::error::{Error, Result};
use crate::types::{TimeSeriesId, UnitSelector, UnitSystem};

/// Default unit of a base parameter in a unit system
pub fn default_unit(base_parameter: &str, system: UnitSystem) -> Option<&'static str> {
    let (si, en) = match base_parameter.to_lowercase().as_str() {
        "elev" | "stage" | "depth" | "height" | "dist" => ("m", "ft"),
        "flow" => ("cms", "cfs"),
        "precip" => ("mm", "in"),
        "temp" => ("C", "F"),
        "stor" => ("m3", "ac-ft"),
        "speed" => ("m/s", "mph"),
        _ => return None,
    };

    Some(match system {
        UnitSystem::Si => si,
        UnitSystem::En => en,
    })
}

/// Resolve the unit values will be returned in for a series.
///
/// Unknown parameters fall back to the unit the series is stored in.
pub fn resolve_units(series: &str, stored_unit: &str, selector: &UnitSelector) -> String {
    match selector {
        UnitSelector::Named(unit) => unit.clone(),
        UnitSelector::System(system) => series
            .parse::<TimeSeriesId>()
            .ok()
            .and_then(|id| default_unit(id.base_parameter(), *system))
            .map_or_else(|| stored_unit.to_string(), str::to_string),
    }
}

/// Linear conversion `to = from * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    scale: f64,
    offset: f64,
}

impl Conversion {
    /// Identity conversion
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset: 0.0,
    };

    /// Apply the conversion to a value
    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }
}

/// Base conversions from the first unit into the second
const CONVERSIONS: &[(&str, &str, f64, f64)] = &[
    ("ft", "m", 0.3048, 0.0),
    ("cfs", "cms", 0.028_316_846_592, 0.0),
    ("kcfs", "cfs", 1_000.0, 0.0),
    ("in", "mm", 25.4, 0.0),
    ("ac-ft", "m3", 1_233.481_837_547_52, 0.0),
    ("mph", "m/s", 0.447_04, 0.0),
    ("F", "C", 5.0 / 9.0, -160.0 / 9.0),
];

/// Find the conversion between two units
pub fn conversion(from: &str, to: &str) -> Result<Conversion> {
    if from.eq_ignore_ascii_case(to) {
        return Ok(Conversion::IDENTITY);
    }

    for (a, b, scale, offset) in CONVERSIONS {
        if a.eq_ignore_ascii_case(from) && b.eq_ignore_ascii_case(to) {
            return Ok(Conversion {
                scale: *scale,
                offset: *offset,
            });
        }
        if b.eq_ignore_ascii_case(from) && a.eq_ignore_ascii_case(to) {
            return Ok(Conversion {
                scale: 1.0 / scale,
                offset: -offset / scale,
            });
        }
    }

    Err(Error::unit_conversion(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_default_units() {
        assert_eq!(default_unit("Flow", UnitSystem::En), Some("cfs"));
        assert_eq!(default_unit("Elev", UnitSystem::Si), Some("m"));
        assert_eq!(default_unit("Code", UnitSystem::Si), None);
    }

    #[test]
    fn test_resolve_units() {
        let series = "Keystone.Flow-Out.Ave.1Hour.1Hour.Rev";
        assert_eq!(
            resolve_units(series, "cms", &UnitSelector::System(UnitSystem::En)),
            "cfs"
        );
        assert_eq!(
            resolve_units(series, "cms", &UnitSelector::Named("kcfs".into())),
            "kcfs"
        );
        assert_eq!(
            resolve_units("Keystone.Code.Inst.0.0.Raw", "n/a", &UnitSelector::default()),
            "n/a"
        );
    }

    #[test]
    fn test_conversions() {
        assert!(approx(conversion("ft", "m").unwrap().apply(10.0), 3.048));
        assert!(approx(conversion("m", "ft").unwrap().apply(3.048), 10.0));
        assert!(approx(conversion("F", "C").unwrap().apply(212.0), 100.0));
        assert!(approx(conversion("C", "F").unwrap().apply(0.0), 32.0));
        assert!(approx(conversion("CFS", "cfs").unwrap().apply(7.5), 7.5));
    }

    #[test]
    fn test_unknown_conversion() {
        let err = conversion("ft", "cfs").unwrap_err();
        assert!(matches!(err, Error::UnitConversion { .. }));
    }
}

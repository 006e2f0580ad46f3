// crates/surface-coverage-core/src/analysis/metrics.rs
// ============================================================================
// Module: Coverage Metrics
// Description: Coverage percentage and surface-unit arithmetic.
// Purpose: Keep the module rollup formulas in one place.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Coverage is the share of a module's surface backed by a non-deprecated
//! construct, rounded half-up to an integer percent. Surface units group
//! properties in tens. A module with no surface has zero coverage.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Properties per surface unit.
pub const PROPS_PER_SURFACE_UNIT: u64 = 10;

/// Upper bound of the coverage percentage.
pub const MAX_COVERAGE_PERCENT: u64 = 100;

// ============================================================================
// SECTION: Formulas
// ============================================================================

/// Returns `round(100 * covered / total)`, or 0 when `total` is 0.
///
/// The result never exceeds [`MAX_COVERAGE_PERCENT`].
#[must_use]
pub fn coverage_percent(covered: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let covered = u128::from(covered.min(total));
    let total = u128::from(total);
    let rounded = (200 * covered + total) / (2 * total);
    u64::try_from(rounded).map_or(MAX_COVERAGE_PERCENT, |value| value.min(MAX_COVERAGE_PERCENT))
}

/// Returns `ceil(total / 10)`.
#[must_use]
pub const fn total_surface_units(total: u64) -> u64 {
    total.div_ceil(PROPS_PER_SURFACE_UNIT)
}

/// Returns `total_su * coverage / 100` as a fractional value.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "surface unit totals stay far below 2^52")]
pub fn covered_surface_units(total_su: u64, coverage: u64) -> f64 {
    total_su as f64 * coverage as f64 / 100.0
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_has_zero_coverage() {
        assert_eq!(coverage_percent(0, 0), 0);
    }

    #[test]
    fn coverage_rounds_half_up() {
        assert_eq!(coverage_percent(1, 3), 33);
        assert_eq!(coverage_percent(2, 3), 67);
        assert_eq!(coverage_percent(1, 8), 13);
        assert_eq!(coverage_percent(1, 200), 1);
        assert_eq!(coverage_percent(1, 201), 0);
    }

    #[test]
    fn surface_units_round_up() {
        assert_eq!(total_surface_units(0), 0);
        assert_eq!(total_surface_units(1), 1);
        assert_eq!(total_surface_units(10), 1);
        assert_eq!(total_surface_units(11), 2);
    }

    #[test]
    fn covered_units_are_fractional() {
        assert!((covered_surface_units(3, 50) - 1.5).abs() < f64::EPSILON);
        assert!((covered_surface_units(1, 100) - 1.0).abs() < f64::EPSILON);
    }
}

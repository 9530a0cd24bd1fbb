//! Estimate-vs-real deviation
//!
//! Compares a recorded real effort against the estimate. Positive deviation
//! means the actual work took longer than estimated.

use serde::Serialize;

use crate::estimate::engine::HOURS_PER_WORKDAY;

/// How far the real effort landed from the estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deviation {
    /// Real minus estimated effort, in workdays
    pub workdays: f64,
    /// Deviation as a percentage of the estimate; 0 when the estimate is 0
    pub percent: f64,
    /// Workday deviation converted to hours
    pub hours: f64,
}

/// Computes the deviation of a recorded real effort from the estimate.
///
/// Returns `None` when no real effort has been recorded: absent or
/// non-positive values mean "not yet recorded", never "took zero effort".
pub fn deviation(estimated_days: f64, real_days: Option<f64>) -> Option<Deviation> {
    let real = real_days.filter(|d| *d > 0.0)?;

    let workdays = real - estimated_days;
    let percent = if estimated_days == 0.0 {
        0.0
    } else {
        workdays / estimated_days * 100.0
    };

    Some(Deviation {
        workdays,
        percent,
        hours: workdays * HOURS_PER_WORKDAY,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrun_scenario() {
        // estimate 30, real 36 -> +6 days, +20%, +48 hours
        let d = deviation(30.0, Some(36.0)).unwrap();
        assert!((d.workdays - 6.0).abs() < 1e-9);
        assert!((d.percent - 20.0).abs() < 1e-9);
        assert!((d.hours - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_under_estimate_is_negative() {
        let d = deviation(40.0, Some(30.0)).unwrap();
        assert!((d.workdays + 10.0).abs() < 1e-9);
        assert!((d.percent + 25.0).abs() < 1e-9);
        assert!((d.hours + 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_estimate_guard() {
        // Percent is exactly 0 when the estimate is 0, whatever the real
        let d = deviation(0.0, Some(12.0)).unwrap();
        assert!((d.workdays - 12.0).abs() < 1e-9);
        assert_eq!(d.percent, 0.0);
    }

    #[test]
    fn test_unrecorded_real_effort() {
        assert_eq!(deviation(30.0, None), None);
        assert_eq!(deviation(30.0, Some(0.0)), None);
        assert_eq!(deviation(30.0, Some(-5.0)), None);
    }
}

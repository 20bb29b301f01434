//! Temperature deviations around a query center.
//!
//! Samples arrive as an unordered, possibly partial set: lattice points
//! whose fetch failed are simply absent. Nothing here assumes the input
//! lines up with the requested lattice.

use urban_greening_scoring_models::{
    Coordinate, DifferenceSample, ReferenceSource, TemperatureField, TemperatureSample,
    config::TemperatureConfig,
};

use crate::{ScoringError, invalid_config};

/// Lattice of query points around `center`.
///
/// Points are `center + (i·step, j·step)` for `i, j ∈ [-n, n]` with
/// `n = floor(radius / step)`; the center itself is always included.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidConfig`] if the step is not positive or
/// the radius is negative.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn sample_lattice(
    center: Coordinate,
    config: &TemperatureConfig,
) -> Result<Vec<Coordinate>, ScoringError> {
    let TemperatureConfig {
        lattice_step: step,
        lattice_radius: radius,
        ..
    } = *config;

    if !step.is_finite() || step <= 0.0 {
        return Err(invalid_config(format!(
            "lattice_step must be positive, got {step}"
        )));
    }
    if !radius.is_finite() || radius < 0.0 {
        return Err(invalid_config(format!(
            "lattice_radius must not be negative, got {radius}"
        )));
    }

    // Tolerate radius/step landing a hair under an integer.
    let n = (radius / step + 1e-9).floor() as i64;

    let mut points = Vec::new();
    for i in -n..=n {
        for j in -n..=n {
            points.push(Coordinate {
                latitude: (i as f64).mul_add(step, center.latitude),
                longitude: (j as f64).mul_add(step, center.longitude),
            });
        }
    }

    Ok(points)
}

/// Computes each sample's deviation from the reference temperature.
///
/// The reference is the sample closest to `center` among those within
/// `tolerance` degrees on both axes. Without such a sample the mean of
/// all samples is used and a warning is logged. Samples with non-finite
/// values are ignored.
///
/// # Errors
///
/// * [`ScoringError::InvalidConfig`] if `tolerance` is negative or not
///   finite.
/// * [`ScoringError::NoTemperatureData`] if no usable sample remains.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(
    samples: &[TemperatureSample],
    center: Coordinate,
    tolerance: f64,
) -> Result<TemperatureField, ScoringError> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(invalid_config(format!(
            "center_tolerance must not be negative, got {tolerance}"
        )));
    }

    let usable: Vec<&TemperatureSample> = samples
        .iter()
        .filter(|s| {
            s.latitude.is_finite() && s.longitude.is_finite() && s.mean_temperature.is_finite()
        })
        .collect();

    if usable.len() < samples.len() {
        log::debug!(
            "Ignoring {} temperature samples with non-finite values",
            samples.len() - usable.len()
        );
    }
    if usable.is_empty() {
        return Err(ScoringError::NoTemperatureData);
    }

    let offset = |s: &TemperatureSample| {
        (
            (s.latitude - center.latitude).abs(),
            (s.longitude - center.longitude).abs(),
        )
    };

    let center_sample = usable
        .iter()
        .filter(|s| {
            let (dlat, dlon) = offset(s);
            dlat <= tolerance && dlon <= tolerance
        })
        .min_by(|a, b| {
            let (alat, alon) = offset(a);
            let (blat, blon) = offset(b);
            alat.hypot(alon).total_cmp(&blat.hypot(blon))
        });

    let (reference_temperature, reference_source) = if let Some(s) = center_sample {
        (s.mean_temperature, ReferenceSource::CenterSample)
    } else {
        let mean = usable.iter().map(|s| s.mean_temperature).sum::<f64>() / usable.len() as f64;
        log::warn!(
            "No temperature sample within {tolerance}° of the center; \
             using the mean of {} samples ({mean:.2} °C) as reference",
            usable.len()
        );
        (mean, ReferenceSource::SampleMean)
    };

    let samples = usable
        .iter()
        .map(|s| DifferenceSample {
            latitude: s.latitude,
            longitude: s.longitude,
            delta: s.mean_temperature - reference_temperature,
        })
        .collect();

    Ok(TemperatureField {
        reference_temperature,
        reference_source,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(latitude: f64, longitude: f64, mean_temperature: f64) -> TemperatureSample {
        TemperatureSample {
            latitude,
            longitude,
            mean_temperature,
        }
    }

    const ORIGIN: Coordinate = Coordinate {
        latitude: 0.0,
        longitude: 0.0,
    };

    #[test]
    fn center_sample_is_reference() {
        let samples = [
            sample(0.0, 0.0, 20.0),
            sample(0.0, 0.001, 22.0),
            sample(0.0, -0.001, 18.0),
        ];
        let field = aggregate(&samples, ORIGIN, 0.0005).unwrap();
        assert!((field.reference_temperature - 20.0).abs() < f64::EPSILON);
        assert_eq!(field.reference_source, ReferenceSource::CenterSample);
        let deltas: Vec<f64> = field.samples.iter().map(|s| s.delta).collect();
        assert_eq!(deltas, vec![0.0, 2.0, -2.0]);
    }

    #[test]
    fn falls_back_to_mean_without_center_sample() {
        let samples = [sample(0.0, 0.001, 22.0), sample(0.0, -0.001, 18.0)];
        let field = aggregate(&samples, ORIGIN, 0.0005).unwrap();
        assert!((field.reference_temperature - 20.0).abs() < 1e-12);
        assert_eq!(field.reference_source, ReferenceSource::SampleMean);
    }

    #[test]
    fn order_of_arrival_does_not_matter() {
        let a = [
            sample(0.0, 0.001, 22.0),
            sample(0.0, 0.0, 20.0),
            sample(0.01, 0.0, 25.0),
        ];
        let b = [a[2], a[0], a[1]];
        let fa = aggregate(&a, ORIGIN, 0.0005).unwrap();
        let fb = aggregate(&b, ORIGIN, 0.0005).unwrap();
        assert!((fa.reference_temperature - fb.reference_temperature).abs() < f64::EPSILON);
    }

    #[test]
    fn closest_of_several_in_window_wins() {
        let samples = [sample(0.0004, 0.0, 30.0), sample(0.0001, 0.0, 10.0)];
        let field = aggregate(&samples, ORIGIN, 0.0005).unwrap();
        assert!((field.reference_temperature - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_tolerance() {
        let samples = [sample(0.0, 0.0, 20.0), sample(0.0, 0.001, 30.0)];
        for tolerance in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                aggregate(&samples, ORIGIN, tolerance),
                Err(ScoringError::InvalidConfig { .. })
            ));
        }
        let exact = aggregate(&samples, ORIGIN, 0.0).unwrap();
        assert_eq!(exact.reference_source, ReferenceSource::CenterSample);
        assert!((exact.reference_temperature - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_samples_is_no_data() {
        assert!(matches!(
            aggregate(&[], ORIGIN, 0.0005),
            Err(ScoringError::NoTemperatureData)
        ));
        assert!(matches!(
            aggregate(&[sample(0.0, 0.0, f64::NAN)], ORIGIN, 0.0005),
            Err(ScoringError::NoTemperatureData)
        ));
    }

    #[test]
    fn lattice_includes_center_and_spans_radius() {
        let center = Coordinate {
            latitude: 48.15,
            longitude: 11.57,
        };
        let points = sample_lattice(center, &TemperatureConfig::default()).unwrap();
        assert_eq!(points.len(), 25);
        assert!(points.iter().any(|p| {
            (p.latitude - center.latitude).abs() < 1e-12
                && (p.longitude - center.longitude).abs() < 1e-12
        }));
        let max_offset = points
            .iter()
            .map(|p| (p.latitude - center.latitude).abs())
            .fold(0.0, f64::max);
        assert!((max_offset - 0.01).abs() < 1e-9);
    }

    #[test]
    fn zero_radius_lattice_is_center_only() {
        let config = TemperatureConfig {
            lattice_radius: 0.0,
            ..TemperatureConfig::default()
        };
        assert_eq!(sample_lattice(ORIGIN, &config).unwrap().len(), 1);
    }

    #[test]
    fn rejects_bad_lattice_step() {
        let config = TemperatureConfig {
            lattice_step: 0.0,
            ..TemperatureConfig::default()
        };
        assert!(sample_lattice(ORIGIN, &config).is_err());
    }
}

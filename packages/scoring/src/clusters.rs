//! Brightness summaries of clustered satellite pixels.
//!
//! The clustering itself happens elsewhere; this module only receives
//! one label per pixel and the matching brightness values.

use urban_greening_scoring_models::{ClusterStats, ClusterSummary, config::BrightnessThresholds};

use crate::ScoringError;

/// Per-pixel brightness in `[0, 1]`: the mean of the RGB channels over 255.
#[must_use]
pub fn brightness_from_rgb(pixels: &[[u8; 3]]) -> Vec<f64> {
    pixels
        .iter()
        .map(|[r, g, b]| (f64::from(*r) + f64::from(*g) + f64::from(*b)) / (3.0 * 255.0))
        .collect()
}

/// Summarizes clusters `0..k`.
///
/// Clusters that received no pixel get an entry without statistics.
///
/// # Errors
///
/// Returns [`ScoringError::ClusterInput`] if the arrays differ in length,
/// a label is `>= k`, or a brightness value is outside `[0, 1]`.
#[allow(clippy::cast_precision_loss)]
pub fn summarize_clusters(
    labels: &[usize],
    brightness: &[f64],
    k: usize,
    thresholds: &BrightnessThresholds,
) -> Result<Vec<ClusterSummary>, ScoringError> {
    if labels.len() != brightness.len() {
        return Err(ScoringError::ClusterInput {
            message: format!(
                "{} labels but {} brightness values",
                labels.len(),
                brightness.len()
            ),
        });
    }

    let mut sums = vec![0.0_f64; k];
    let mut counts = vec![0_usize; k];

    for (pixel, (&label, &value)) in labels.iter().zip(brightness).enumerate() {
        if label >= k {
            return Err(ScoringError::ClusterInput {
                message: format!("pixel {pixel} has label {label}, expected < {k}"),
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScoringError::ClusterInput {
                message: format!("pixel {pixel} has brightness {value} outside [0, 1]"),
            });
        }
        sums[label] += value;
        counts[label] += 1;
    }

    let summaries: Vec<ClusterSummary> = (0..k)
        .map(|label| {
            let pixel_count = counts[label];
            let stats = (pixel_count > 0).then(|| {
                let mean_brightness = sums[label] / pixel_count as f64;
                ClusterStats {
                    mean_brightness,
                    bucket: thresholds.bucket(mean_brightness),
                }
            });
            ClusterSummary {
                label,
                pixel_count,
                stats,
            }
        })
        .collect();

    let empty = summaries.iter().filter(|s| s.stats.is_none()).count();
    if empty > 0 {
        log::debug!("{empty} of {k} clusters received no pixels");
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use urban_greening_scoring_models::BrightnessBucket;

    use super::*;

    #[test]
    fn two_clusters_bucket_by_ladder() {
        let labels = [0, 0, 1, 1];
        let brightness = [0.9, 0.9, 0.1, 0.1];
        let summaries =
            summarize_clusters(&labels, &brightness, 2, &BrightnessThresholds::default()).unwrap();

        let bright = summaries[0].stats.unwrap();
        assert!((bright.mean_brightness - 0.9).abs() < 1e-12);
        assert_eq!(bright.bucket, BrightnessBucket::VeryBright);

        let dark = summaries[1].stats.unwrap();
        assert!((dark.mean_brightness - 0.1).abs() < 1e-12);
        assert_eq!(dark.bucket, BrightnessBucket::Dark);
    }

    #[test]
    fn empty_cluster_has_no_stats() {
        let summaries =
            summarize_clusters(&[0, 2], &[0.4, 0.6], 3, &BrightnessThresholds::default()).unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[1].pixel_count, 0);
        assert!(summaries[1].stats.is_none());
        assert_eq!(summaries[2].stats.unwrap().bucket, BrightnessBucket::Bright);
    }

    #[test]
    fn rejects_inconsistent_input() {
        let t = BrightnessThresholds::default();
        assert!(summarize_clusters(&[0, 1], &[0.5], 2, &t).is_err());
        assert!(summarize_clusters(&[0, 3], &[0.5, 0.5], 2, &t).is_err());
        assert!(summarize_clusters(&[0], &[1.5], 1, &t).is_err());
        assert!(summarize_clusters(&[0], &[f64::NAN], 1, &t).is_err());
    }

    #[test]
    fn rgb_brightness_spans_unit_interval() {
        let b = brightness_from_rgb(&[[0, 0, 0], [255, 255, 255], [255, 0, 0]]);
        assert!(b[0].abs() < f64::EPSILON);
        assert!((b[1] - 1.0).abs() < f64::EPSILON);
        assert!((b[2] - 1.0 / 3.0).abs() < 1e-12);
    }
}

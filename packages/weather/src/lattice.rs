//! Concurrent daily-mean fetch over a set of points.

use futures::{StreamExt as _, stream};
use urban_greening_scoring_models::{Coordinate, TemperatureSample};

use crate::{DateRange, open_meteo::OpenMeteo};

/// Fetches the mean daily temperature at every point, at most
/// `concurrent_requests` at a time.
///
/// Points whose request fails or yields no data are dropped with a
/// warning. Samples come back in completion order.
pub async fn fetch_lattice(
    api: &OpenMeteo,
    points: &[Coordinate],
    range: DateRange,
    concurrent_requests: usize,
) -> Vec<TemperatureSample> {
    let concurrency = concurrent_requests.max(1);
    log::info!(
        "Fetching {} temperature point(s) for {}..{} (concurrency={concurrency})",
        points.len(),
        range.start,
        range.end
    );

    let results: Vec<_> = stream::iter(points.iter().map(|point| async move {
        let result = api
            .fetch_daily_mean(point.latitude, point.longitude, range)
            .await;
        (*point, result)
    }))
    .buffer_unordered(concurrency)
    .collect()
    .await;

    let mut samples = Vec::with_capacity(results.len());
    for (point, result) in results {
        match result {
            Ok(Some(mean_temperature)) => samples.push(TemperatureSample {
                latitude: point.latitude,
                longitude: point.longitude,
                mean_temperature,
            }),
            Ok(None) => {
                log::warn!(
                    "No temperature data at ({:.5}, {:.5})",
                    point.latitude,
                    point.longitude
                );
            }
            Err(e) => {
                log::warn!(
                    "Temperature fetch failed at ({:.5}, {:.5}): {e}",
                    point.latitude,
                    point.longitude
                );
            }
        }
    }

    log::info!("Resolved {}/{} temperature point(s)", samples.len(), points.len());
    samples
}

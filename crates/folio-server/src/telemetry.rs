use axum::http::StatusCode;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

const MAX_LATENCY_SAMPLES: usize = 1024;

const LATENCY_BOUNDS_SECONDS: [f64; 10] =
    [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Per-route request counters and latency samples, rendered as Prometheus
/// text by the `/metrics` endpoint.
#[derive(Default)]
pub struct RequestMetrics {
    counters: Mutex<BTreeMap<(&'static str, u16), u64>>,
    latency_ns: Mutex<BTreeMap<&'static str, VecDeque<u64>>>,
}

impl RequestMetrics {
    pub async fn observe_request(&self, route: &'static str, status: StatusCode, elapsed: Duration) {
        {
            let mut counters = self.counters.lock().await;
            *counters.entry((route, status.as_u16())).or_insert(0) += 1;
        }
        let mut latency = self.latency_ns.lock().await;
        let samples = latency.entry(route).or_default();
        if samples.len() == MAX_LATENCY_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(elapsed.as_nanos() as u64);
    }

    pub async fn render(&self) -> String {
        let mut body = String::new();
        body.push_str("# TYPE folio_requests_total counter\n");
        {
            let counters = self.counters.lock().await;
            for ((route, status), count) in counters.iter() {
                body.push_str(&format!(
                    "folio_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
                ));
            }
        }
        body.push_str("# TYPE folio_request_duration_seconds histogram\n");
        let latency = self.latency_ns.lock().await;
        for (route, samples) in latency.iter() {
            let contiguous: Vec<u64> = samples.iter().copied().collect();
            push_histogram_from_samples(
                &mut body,
                "folio_request_duration_seconds",
                &format!("route=\"{route}\""),
                &contiguous,
                &LATENCY_BOUNDS_SECONDS,
            );
        }
        body
    }
}

fn push_histogram_from_samples(
    body: &mut String,
    metric_name: &str,
    base_labels: &str,
    samples_ns: &[u64],
    bounds_seconds: &[f64],
) {
    let mut count_le = vec![0_u64; bounds_seconds.len()];
    let mut sum_seconds = 0.0_f64;
    for sample in samples_ns {
        let seconds = *sample as f64 / 1_000_000_000.0;
        sum_seconds += seconds;
        for (i, bound) in bounds_seconds.iter().enumerate() {
            if seconds <= *bound {
                count_le[i] += 1;
            }
        }
    }
    for (i, bound) in bounds_seconds.iter().enumerate() {
        body.push_str(&format!(
            "{metric_name}_bucket{{{base_labels},le=\"{bound}\"}} {}\n",
            count_le[i]
        ));
    }
    body.push_str(&format!(
        "{metric_name}_bucket{{{base_labels},le=\"+Inf\"}} {}\n",
        samples_ns.len()
    ));
    body.push_str(&format!(
        "{metric_name}_sum{{{base_labels}}} {sum_seconds:.9}\n"
    ));
    body.push_str(&format!(
        "{metric_name}_count{{{base_labels}}} {}\n",
        samples_ns.len()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_and_histograms_render() {
        let metrics = RequestMetrics::default();
        metrics
            .observe_request("/v1/profile", StatusCode::OK, Duration::from_millis(12))
            .await;
        metrics
            .observe_request("/v1/profile", StatusCode::OK, Duration::from_millis(30))
            .await;
        metrics
            .observe_request(
                "/v1/profile",
                StatusCode::UNAUTHORIZED,
                Duration::from_millis(1),
            )
            .await;

        let body = metrics.render().await;
        assert!(body.contains("folio_requests_total{route=\"/v1/profile\",status=\"200\"} 2"));
        assert!(body.contains("folio_requests_total{route=\"/v1/profile\",status=\"401\"} 1"));
        assert!(body.contains("folio_request_duration_seconds_count{route=\"/v1/profile\"} 3"));
    }

    #[tokio::test]
    async fn latency_buffer_is_bounded() {
        let metrics = RequestMetrics::default();
        for _ in 0..(MAX_LATENCY_SAMPLES + 10) {
            metrics
                .observe_request("/healthz", StatusCode::OK, Duration::from_micros(5))
                .await;
        }
        let body = metrics.render().await;
        assert!(body.contains(&format!(
            "folio_request_duration_seconds_count{{route=\"/healthz\"}} {MAX_LATENCY_SAMPLES}"
        )));
    }
}

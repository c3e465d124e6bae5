//! Reading counters out of a `metrics-util` debugging recorder.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

/// Fresh recorder and the snapshotter observing it.
#[must_use]
pub fn debugging_recorder() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

/// Sum of every counter called `name` whose labels include all of `labels`.
#[must_use]
pub fn counter_total(snapshotter: &Snapshotter, name: &str, labels: &[(&str, &str)]) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, _, _, _)| {
            key.key().name() == name
                && labels.iter().all(|(k, v)| {
                    key.key()
                        .labels()
                        .any(|label| label.key() == *k && label.value() == *v)
                })
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(count) => count,
            _ => 0,
        })
        .sum()
}

/// Last value of the gauge called `name`, if recorded.
#[must_use]
pub fn gauge_value(snapshotter: &Snapshotter, name: &str) -> Option<f64> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find_map(|(key, _, _, value)| match value {
            DebugValue::Gauge(gauge) if key.key().name() == name => Some(gauge.into_inner()),
            _ => None,
        })
}

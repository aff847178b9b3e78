use super::MetricType;

/// Accumulated statistics for one metric series.
#[derive(Default, Debug, Clone)]
struct MetricSeries {
    data: Vec<f64>,
    peak_value: f64,
    sum: f64, // Track sum for efficient average calculation
}

impl MetricSeries {
    fn push(&mut self, value: f64) {
        if self.data.is_empty() || value > self.peak_value {
            self.peak_value = value;
        }
        self.sum += value;
        self.data.push(value);
    }

    fn average(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.sum / self.data.len() as f64
    }
}

/// A borrowed suffix of the stored history, ready for plotting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedView<'a> {
    pub times: &'a [f64],
    pub cpu: &'a [f64],
    pub ram: &'a [f64],
}

impl WindowedView<'_> {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn values(&self, metric: MetricType) -> &[f64] {
        match metric {
            MetricType::Cpu => self.cpu,
            MetricType::Memory => self.ram,
        }
    }

    /// `[elapsed, value]` pairs for the given metric.
    pub fn points(&self, metric: MetricType) -> Vec<[f64; 2]> {
        self.times
            .iter()
            .zip(self.values(metric))
            .map(|(&t, &v)| [t, v])
            .collect()
    }
}

/// Full CPU and memory history of one monitored process.
///
/// Nothing is ever evicted: the display window only narrows what
/// [`SeriesStore::windowed_view`] returns, while averages and peaks cover
/// everything recorded since monitoring began.
#[derive(Default, Debug, Clone)]
pub struct SeriesStore {
    /// Seconds since the process was added to the monitor
    elapsed: Vec<f64>,
    cpu: MetricSeries,
    ram: MetricSeries,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one sample. Timestamps must not go backwards; a stale one is
    /// clamped to the latest stored time.
    pub fn append(&mut self, elapsed_seconds: f64, cpu_value: f64, ram_value: f64) {
        let last = self.elapsed.last().copied();
        debug_assert!(
            last.map_or(true, |last| elapsed_seconds >= last),
            "elapsed time went backwards: {elapsed_seconds} < {last:?}"
        );
        let elapsed_seconds = match last {
            Some(last) if elapsed_seconds < last => last,
            _ => elapsed_seconds,
        };

        self.elapsed.push(elapsed_seconds);
        self.cpu.push(cpu_value);
        self.ram.push(ram_value);
    }

    pub fn len(&self) -> usize {
        self.elapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elapsed.is_empty()
    }

    /// Seconds covered by the stored history.
    pub fn span(&self) -> f64 {
        match (self.elapsed.first(), self.elapsed.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    /// Returns the longest suffix whose samples all lie within
    /// `window_seconds` of the newest one. `None` returns the whole history.
    pub fn windowed_view(&self, window_seconds: Option<f64>) -> WindowedView<'_> {
        let start = match (window_seconds, self.elapsed.last()) {
            (Some(window), Some(&newest)) => {
                self.elapsed.partition_point(|&t| newest - t > window)
            }
            _ => 0,
        };

        WindowedView {
            times: &self.elapsed[start..],
            cpu: &self.cpu.data[start..],
            ram: &self.ram.data[start..],
        }
    }

    /// Mean over the entire history, independent of any display window.
    pub fn running_average(&self, metric: MetricType) -> f64 {
        self.series(metric).average()
    }

    pub fn peak(&self, metric: MetricType) -> Option<f64> {
        let series = self.series(metric);
        (!series.data.is_empty()).then_some(series.peak_value)
    }

    pub fn last(&self, metric: MetricType) -> Option<f64> {
        self.series(metric).data.last().copied()
    }

    fn series(&self, metric: MetricType) -> &MetricSeries {
        match metric {
            MetricType::Cpu => &self.cpu,
            MetricType::Memory => &self.ram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(times: &[f64]) -> SeriesStore {
        let mut store = SeriesStore::new();
        for (i, &t) in times.iter().enumerate() {
            store.append(t, i as f64, 10.0 * i as f64);
        }
        store
    }

    #[test]
    fn empty_store_has_no_stats() {
        let store = SeriesStore::new();
        assert!(store.is_empty());
        assert!(store.windowed_view(Some(10.0)).is_empty());
        assert_eq!(store.running_average(MetricType::Cpu), 0.0);
        assert_eq!(store.peak(MetricType::Cpu), None);
        assert_eq!(store.last(MetricType::Memory), None);
    }

    #[test]
    fn window_returns_suffix_within_span() {
        let times = [0.0, 1.5, 2.0, 4.0, 7.5, 8.0, 12.0, 13.0];
        let store = store_with(&times);

        for window in [0.0, 0.5, 1.0, 3.0, 5.0, 5.5, 12.0, 13.0, 100.0] {
            let view = store.windowed_view(Some(window));
            let newest = *view.times.last().unwrap();
            assert_eq!(newest, 13.0);
            assert_eq!(view.cpu.len(), view.len());
            assert_eq!(view.ram.len(), view.len());
            assert!(view.times.iter().all(|t| newest - t <= window));

            // maximal: the sample just before the suffix is outside the window
            let start = times.len() - view.len();
            if start > 0 {
                assert!(newest - times[start - 1] > window);
            }
        }
    }

    #[test]
    fn window_larger_than_history_returns_everything() {
        let store = store_with(&[0.0, 2.0, 4.0]);
        assert_eq!(store.windowed_view(Some(60.0)).len(), 3);
        assert_eq!(store.windowed_view(None).len(), 3);
    }

    #[test]
    fn windowed_view_does_not_drop_history() {
        let store = store_with(&[0.0, 10.0, 20.0, 30.0]);
        assert_eq!(store.windowed_view(Some(10.0)).len(), 2);
        assert_eq!(store.len(), 4);
        assert_eq!(store.windowed_view(None).times, &[0.0, 10.0, 20.0, 30.0]);
    }

    #[test]
    fn running_average_covers_full_history() {
        let mut store = SeriesStore::new();
        store.append(0.0, 10.0, 100.0);
        store.append(20.0, 20.0, 200.0);
        store.append(40.0, 60.0, 300.0);

        let view = store.windowed_view(Some(10.0));
        assert_eq!(view.cpu, &[60.0]);
        assert_eq!(store.running_average(MetricType::Cpu), 30.0);
        assert_eq!(store.running_average(MetricType::Memory), 200.0);
    }

    #[test]
    fn tracks_peak_and_last_values() {
        let mut store = SeriesStore::new();
        store.append(0.0, 5.0, 1.0);
        store.append(1.0, 50.0, 3.0);
        store.append(2.0, 25.0, 2.0);

        assert_eq!(store.peak(MetricType::Cpu), Some(50.0));
        assert_eq!(store.peak(MetricType::Memory), Some(3.0));
        assert_eq!(store.last(MetricType::Cpu), Some(25.0));
        assert_eq!(store.span(), 2.0);
    }

    #[test]
    fn points_pair_time_with_metric() {
        let mut store = SeriesStore::new();
        store.append(0.0, 25.0, 10.0);
        store.append(2.0, 35.0, 12.0);

        let view = store.windowed_view(None);
        assert_eq!(view.points(MetricType::Cpu), vec![[0.0, 25.0], [2.0, 35.0]]);
        assert_eq!(view.points(MetricType::Memory), vec![[0.0, 10.0], [2.0, 12.0]]);
    }
}

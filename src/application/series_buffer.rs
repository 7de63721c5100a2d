// Rolling sample window per metric series
use std::collections::{BTreeMap, VecDeque};

/// A sample slot; `None` means no data for that tick.
pub type Sample = Option<f64>;

/// Fixed-capacity rolling window per series. Every series always holds
/// exactly `capacity` slots, oldest first.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    capacity: usize,
    series: BTreeMap<String, VecDeque<Sample>>,
}

impl SeriesBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            series: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register a series filled with empty slots. Existing series are left alone.
    pub fn ensure_series(&mut self, id: &str) {
        let capacity = self.capacity;
        self.series
            .entry(id.to_string())
            .or_insert_with(|| std::iter::repeat_n(None, capacity).collect());
    }

    /// Keep only the listed series.
    pub fn retain_series<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let keep: Vec<&str> = ids.into_iter().collect();
        self.series.retain(|id, _| keep.contains(&id.as_str()));
    }

    /// Append one sample, evicting from the front once at capacity.
    pub fn push(&mut self, id: &str, value: Sample) {
        self.ensure_series(id);
        let capacity = self.capacity;
        if let Some(samples) = self.series.get_mut(id) {
            samples.push_back(value);
            while samples.len() > capacity {
                samples.pop_front();
            }
        }
    }

    /// Change capacity, trimming or padding at the oldest end so the newest
    /// sample keeps its position.
    pub fn resize_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        for samples in self.series.values_mut() {
            while samples.len() > capacity {
                samples.pop_front();
            }
            while samples.len() < capacity {
                samples.push_front(None);
            }
        }
    }

    pub fn samples(&self, id: &str) -> Option<&VecDeque<Sample>> {
        self.series.get(id)
    }

    pub fn series_ids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Most recent non-null sample of a series.
    pub fn latest(&self, id: &str) -> Sample {
        self.series
            .get(id)
            .and_then(|samples| samples.iter().rev().find_map(|s| *s))
    }

    /// Minimum non-null value across the series selected by `include`;
    /// `None` when none of them hold data.
    pub fn visible_minimum<F>(&self, include: F) -> Option<f64>
    where
        F: Fn(&str) -> bool,
    {
        self.series
            .iter()
            .filter(|(id, _)| include(id))
            .flat_map(|(_, samples)| samples.iter().filter_map(|s| *s))
            .filter(|v| v.is_finite())
            .fold(None, |min: Option<f64>, v| Some(min.map_or(v, |m| m.min(v))))
    }
}

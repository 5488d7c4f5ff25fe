//! Derived read models returned to callers.
//!
//! Nothing in this module is persisted; every value is recomputed from the
//! month buckets on each read.

use crate::model::date::DateValue;
use crate::model::habit::HabitDefinition;
use serde::Serialize;

/// One step of a cumulative done-count chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartPoint {
    pub date: DateValue,
    pub cumulative_count: u32,
}

impl ChartPoint {
    pub fn new(date: DateValue, cumulative_count: u32) -> Self {
        Self {
            date,
            cumulative_count,
        }
    }
}

/// Compressed cumulative step series: only state-change and boundary points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChartSeries(Vec<ChartPoint>);

impl ChartSeries {
    pub fn from_points(points: Vec<ChartPoint>) -> Self {
        Self(points)
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&ChartPoint> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&ChartPoint> {
        self.0.last()
    }

    /// Splits the series into the parallel label/value lists plotting
    /// widgets consume.
    pub fn to_chart_data(&self) -> ChartData {
        ChartData {
            dates: self.0.iter().map(|p| p.date.to_chart_string()).collect(),
            values: self.0.iter().map(|p| p.cumulative_count).collect(),
        }
    }
}

/// Plot payload with `yyyy/MM/dd` labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub dates: Vec<String>,
    pub values: Vec<u32>,
}

/// Per-habit statistics for one date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitRecord {
    pub definition: HabitDefinition,
    pub all_time_done_count: u32,
    pub window_start: DateValue,
    pub window_end: DateValue,
    pub done_dates_in_window: Vec<DateValue>,
    pub chart_series: ChartSeries,
}

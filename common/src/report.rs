//! Summaries printed by the inspection commands.

use crate::store_api::{Direction, RemoteStore};
use crate::verify::{self, Verifier, decode_rows};
use crate::{
    ATTRACTIONS_TABLE, AttractionRecord, HOTELS_TABLE, HotelRecord, Row, SyncError,
    TRANSPORT_TABLE, TransportRecord,
};
use itertools::{Itertools, MinMaxResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct HotelReport {
    pub total: usize,
    pub five_star: usize,
    /// (stars, hotels), ascending by stars.
    pub by_stars: Vec<(u8, usize)>,
    pub by_category: Vec<(String, usize)>,
}

impl HotelReport {
    /// # Errors
    /// Returns a query error if a row is not a hotel.
    pub fn from_rows(rows: &[Row]) -> Result<Self, SyncError> {
        let hotels: Vec<HotelRecord> = decode_rows(HOTELS_TABLE, rows)?;
        Ok(Self {
            total: verify::count_rows(rows),
            five_star: verify::count_where(rows, "stars", 5),
            by_stars: hotels
                .iter()
                .map(|h| h.stars)
                .counts()
                .into_iter()
                .sorted()
                .collect(),
            by_category: verify::value_counts(rows, "category"),
        })
    }

    /// # Errors
    /// Returns a connection or query error if the hotels cannot be read.
    pub fn load<S: RemoteStore + ?Sized>(store: &S) -> Result<Self, SyncError> {
        let rows = Verifier::new(HOTELS_TABLE)
            .order_by("stars", Direction::Descending)
            .fetch(store)?;
        Self::from_rows(&rows)
    }
}

impl fmt::Display for HotelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hotels: {} ({} five-star)", self.total, self.five_star)?;
        writeln!(f, "By stars:")?;
        for (stars, count) in &self.by_stars {
            writeln!(f, "  {stars}★  {count}")?;
        }
        writeln!(f, "By category:")?;
        for (category, count) in &self.by_category {
            writeln!(f, "  {category:<12} {count}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransportReport {
    pub total: usize,
    pub average_cost_per_day: Option<f64>,
    /// (label, cost per day)
    pub cheapest: Option<(String, f64)>,
    pub priciest: Option<(String, f64)>,
}

impl TransportReport {
    /// # Errors
    /// Returns a query error if a row is not a transport option.
    pub fn from_rows(rows: &[Row]) -> Result<Self, SyncError> {
        let options: Vec<TransportRecord> = decode_rows(TRANSPORT_TABLE, rows)?;
        let labelled = |t: &TransportRecord| (t.label.clone(), t.cost_per_day);
        let (cheapest, priciest) = match options
            .iter()
            .minmax_by(|a, b| a.cost_per_day.total_cmp(&b.cost_per_day))
        {
            MinMaxResult::NoElements => (None, None),
            MinMaxResult::OneElement(t) => (Some(labelled(t)), Some(labelled(t))),
            MinMaxResult::MinMax(lo, hi) => (Some(labelled(lo)), Some(labelled(hi))),
        };
        Ok(Self {
            total: verify::count_rows(rows),
            average_cost_per_day: verify::mean(rows, "cost_per_day"),
            cheapest,
            priciest,
        })
    }

    /// # Errors
    /// Returns a connection or query error if the transport options cannot be read.
    pub fn load<S: RemoteStore + ?Sized>(store: &S) -> Result<Self, SyncError> {
        let rows = Verifier::new(TRANSPORT_TABLE)
            .order_by("cost_per_day", Direction::Ascending)
            .fetch(store)?;
        Self::from_rows(&rows)
    }
}

impl fmt::Display for TransportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transport options: {}", self.total)?;
        match self.average_cost_per_day {
            Some(avg) => writeln!(f, "Average cost per day: {avg:.2}")?,
            None => writeln!(f, "Average cost per day: n/a")?,
        }
        if let Some((label, cost)) = &self.cheapest {
            writeln!(f, "Cheapest: {label} ({cost})")?;
        }
        if let Some((label, cost)) = &self.priciest {
            writeln!(f, "Priciest: {label} ({cost})")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttractionReport {
    pub total: usize,
    pub emirates: usize,
    pub by_emirate: Vec<(String, usize)>,
}

impl AttractionReport {
    /// # Errors
    /// Returns a query error if a row is not an attraction.
    pub fn from_rows(rows: &[Row]) -> Result<Self, SyncError> {
        // decode only to reject rows without a name or emirate
        decode_rows::<AttractionRecord>(ATTRACTIONS_TABLE, rows)?;
        Ok(Self {
            total: verify::count_rows(rows),
            emirates: verify::count_distinct(rows, "emirate"),
            by_emirate: verify::value_counts(rows, "emirate"),
        })
    }

    /// # Errors
    /// Returns a connection or query error if the attractions cannot be read.
    pub fn load<S: RemoteStore + ?Sized>(store: &S) -> Result<Self, SyncError> {
        let rows = Verifier::new(ATTRACTIONS_TABLE)
            .order_by("emirate", Direction::Ascending)
            .fetch(store)?;
        Self::from_rows(&rows)
    }
}

impl fmt::Display for AttractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Attractions: {} across {} emirates",
            self.total, self.emirates
        )?;
        for (emirate, count) in &self.by_emirate {
            writeln!(f, "  {emirate:<16} {count}")?;
        }
        Ok(())
    }
}

//! Calendar clock abstraction.
//!
//! # Responsibility
//! - Provide "today" to date-based computations without ambient globals.
//!
//! # Invariants
//! - Calls within the same calendar day observe the same date.

use chrono::{Local, NaiveDate};
use std::cell::Cell;

/// Source of the current calendar date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation using the local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    today: Cell<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Cell::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        self.today.set(today);
    }

    /// Moves the clock forward by `days` (backwards when negative).
    pub fn advance_days(&self, days: i64) {
        let next = self.today.get() + chrono::Duration::days(days);
        self.today.set(next);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

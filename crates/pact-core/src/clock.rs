//! Wall-clock abstraction.
//!
//! Event timestamps are taken in UTC; reminder due-times use local wall time.
//! Both readings come from a [`Clock`] so tests can pin and advance time.

use std::cell::Cell;

use chrono::{
  DateTime, Duration, FixedOffset, Local, NaiveDateTime, Offset as _, Utc,
};

/// A source of the current time.
pub trait Clock {
  /// The current instant, used for event timestamps.
  fn now_utc(&self) -> DateTime<Utc>;

  /// The current local wall time, used for reminder due-times.
  fn now_local(&self) -> NaiveDateTime;
}

impl<C: Clock + ?Sized> Clock for &C {
  fn now_utc(&self) -> DateTime<Utc> { (**self).now_utc() }

  fn now_local(&self) -> NaiveDateTime { (**self).now_local() }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_utc(&self) -> DateTime<Utc> { Utc::now() }

  fn now_local(&self) -> NaiveDateTime { Local::now().naive_local() }
}

/// A manually driven clock with a fixed local offset.
#[derive(Debug, Clone)]
pub struct ManualClock {
  now:    Cell<DateTime<Utc>>,
  offset: FixedOffset,
}

impl ManualClock {
  /// A clock pinned at `now` whose local time equals UTC.
  pub fn new(now: DateTime<Utc>) -> Self {
    Self::with_offset(now, Utc.fix())
  }

  /// A clock pinned at `now` whose local time is `now` shifted by `offset`.
  pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
    Self {
      now: Cell::new(now),
      offset,
    }
  }

  pub fn set(&self, now: DateTime<Utc>) { self.now.set(now); }

  pub fn advance(&self, by: Duration) { self.now.set(self.now.get() + by); }
}

impl Clock for ManualClock {
  fn now_utc(&self) -> DateTime<Utc> { self.now.get() }

  fn now_local(&self) -> NaiveDateTime {
    self.now.get().with_timezone(&self.offset).naive_local()
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn manual_clock_applies_local_offset() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let clock =
      ManualClock::with_offset(now, FixedOffset::east_opt(2 * 3600).unwrap());

    assert_eq!(clock.now_utc(), now);
    assert_eq!(
      clock.now_local(),
      now.naive_utc() + Duration::hours(2),
    );
  }

  #[test]
  fn manual_clock_advances() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualClock::new(now);
    clock.advance(Duration::days(3));
    assert_eq!(clock.now_utc(), now + Duration::days(3));
    assert_eq!(clock.now_local(), (now + Duration::days(3)).naive_utc());
  }
}

//! Per-party signing reminders.
//!
//! Reminders live only in memory and are checked on demand; nothing fires on
//! its own. Due-times are local wall time at whole-second precision.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime};

use crate::record::TIMESTAMP_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
  pub party: String,
  pub due:   NaiveDateTime,
}

impl Reminder {
  pub fn is_overdue(&self, now: NaiveDateTime) -> bool { self.due < now }
}

impl fmt::Display for Reminder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} by {}", self.party, self.due.format(TIMESTAMP_FORMAT))
  }
}

/// Reminders keyed by party, kept in first-insertion order.
#[derive(Debug, Clone, Default)]
pub struct Reminders {
  entries: Vec<Reminder>,
}

impl Reminders {
  /// Set `party`'s reminder to `now + days`. A party's existing reminder is
  /// replaced in place. Negative `days` yields a due-time in the past.
  ///
  /// Returns `None`, changing nothing, if the due-time is out of range.
  pub fn set(
    &mut self,
    party: &str,
    days: i64,
    now: NaiveDateTime,
  ) -> Option<NaiveDateTime> {
    let due = Duration::try_days(days)
      .and_then(|offset| now.checked_add_signed(offset))
      .map(truncate_to_seconds)?;
    match self.entries.iter_mut().find(|r| r.party == party) {
      Some(existing) => existing.due = due,
      None => self.entries.push(Reminder {
        party: party.to_owned(),
        due,
      }),
    }
    Some(due)
  }

  pub fn get(&self, party: &str) -> Option<&Reminder> {
    self.entries.iter().find(|r| r.party == party)
  }

  /// Reminders whose due-time is strictly before `now`. Fired reminders are
  /// kept, so they fire again on the next check.
  pub fn overdue(&self, now: NaiveDateTime) -> impl Iterator<Item = &Reminder> {
    self.entries.iter().filter(move |r| r.is_overdue(now))
  }

  pub fn iter(&self) -> impl Iterator<Item = &Reminder> { self.entries.iter() }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

fn truncate_to_seconds(at: NaiveDateTime) -> NaiveDateTime {
  DateTime::from_timestamp(at.and_utc().timestamp(), 0)
    .map(|dt| dt.naive_utc())
    .unwrap_or(at)
}

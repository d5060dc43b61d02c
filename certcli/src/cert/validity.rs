use rcgen::CertificateParams;
use time::{Date, Duration, OffsetDateTime};

use crate::{Error, Result};

/// Validity window of a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
	/// Start of the window.
	pub not_before: OffsetDateTime,
	/// End of the window.
	pub not_after: OffsetDateTime,
}

impl Validity {
	/// Valid from now for `months` calendar months.
	pub fn months(months: u32) -> Result<Self> {
		Self::months_from(OffsetDateTime::now_utc(), months)
	}

	/// Valid from now for `days` days.
	pub fn days(days: u32) -> Result<Self> {
		Self::days_from(OffsetDateTime::now_utc(), days)
	}

	/// Valid from `start` for `months` calendar months.
	pub fn months_from(start: OffsetDateTime, months: u32) -> Result<Self> {
		Ok(Self {
			not_before: start,
			not_after: add_months(start, months)?,
		})
	}

	/// Valid from `start` for `days` days.
	pub fn days_from(start: OffsetDateTime, days: u32) -> Result<Self> {
		let not_after = start
			.checked_add(Duration::days(days.into()))
			.ok_or_else(|| out_of_range(days, "days"))?;
		Ok(Self {
			not_before: start,
			not_after,
		})
	}

	pub(crate) fn apply(&self, params: &mut CertificateParams) {
		params.not_before = self.not_before;
		params.not_after = self.not_after;
	}
}

/// Add calendar months, keeping the day of month and time of day.
///
/// Days past the end of the target month roll over into the next one, so
/// January 31st plus one month is March 3rd (2nd in leap years).
pub fn add_months(start: OffsetDateTime, months: u32) -> Result<OffsetDateTime> {
	let month_index = u64::from(start.month() as u8 - 1) + u64::from(months);
	let year = i32::try_from(month_index / 12)
		.ok()
		.and_then(|years| start.year().checked_add(years))
		.ok_or_else(|| out_of_range(months, "months"))?;
	let month = start.month().nth_next((months % 12) as u8);

	let first = Date::from_calendar_date(year, month, 1).map_err(|_| out_of_range(months, "months"))?;
	let date = first
		.checked_add(Duration::days(i64::from(start.day()) - 1))
		.ok_or_else(|| out_of_range(months, "months"))?;
	Ok(start.replace_date(date))
}

fn out_of_range(amount: u32, unit: &str) -> Error {
	Error::Usage(format!("a validity of {amount} {unit} is out of range"))
}

#[cfg(test)]
mod tests {
	use time::Month;

	use super::*;

	fn at(year: i32, month: Month, day: u8) -> OffsetDateTime {
		Date::from_calendar_date(year, month, day)
			.unwrap()
			.with_hms(12, 30, 0)
			.unwrap()
			.assume_utc()
	}

	#[test]
	fn adds_plain_months() {
		assert_eq!(
			add_months(at(2023, Month::May, 15), 3).unwrap(),
			at(2023, Month::August, 15)
		);
	}

	#[test]
	fn crosses_year_boundary() {
		assert_eq!(
			add_months(at(2023, Month::December, 15), 3).unwrap(),
			at(2024, Month::March, 15)
		);
		assert_eq!(
			add_months(at(2023, Month::January, 1), 24).unwrap(),
			at(2025, Month::January, 1)
		);
	}

	#[test]
	fn overflowing_days_roll_over() {
		assert_eq!(
			add_months(at(2023, Month::January, 31), 1).unwrap(),
			at(2023, Month::March, 3)
		);
		assert_eq!(
			add_months(at(2024, Month::January, 31), 1).unwrap(),
			at(2024, Month::March, 2)
		);
	}

	#[test]
	fn zero_months_is_identity() {
		let start = at(2023, Month::June, 30);
		assert_eq!(add_months(start, 0).unwrap(), start);
	}

	#[test]
	fn day_validity() {
		let v = Validity::days_from(at(2023, Month::December, 20), 30).unwrap();
		assert_eq!(v.not_before, at(2023, Month::December, 20));
		assert_eq!(v.not_after, at(2024, Month::January, 19));
	}

	#[test]
	fn absurd_validity_is_rejected() {
		assert!(add_months(at(2023, Month::December, 1), u32::MAX).is_err());
	}
}

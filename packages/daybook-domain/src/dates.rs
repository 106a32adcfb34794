use time::{
	Date, Duration, OffsetDateTime, PrimitiveDateTime, Time,
	format_description::{BorrowedFormatItem, well_known::Rfc3339},
	macros::format_description,
};

pub const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_iso_date(raw: &str) -> Option<Date> {
	Date::parse(raw.trim(), ISO_DATE).ok()
}

pub fn format_iso_date(date: Date) -> String {
	date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}

/// Half-open UTC window `[date 00:00, next day 00:00)`.
pub fn day_window(date: Date) -> (OffsetDateTime, OffsetDateTime) {
	let start = PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc();

	(start, start + Duration::days(1))
}

/// The calendar date a timestamp falls on in its own offset.
pub fn date_bucket(ts: OffsetDateTime) -> Date {
	ts.date()
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD`, which reads as UTC midnight.
pub fn parse_instant(raw: &str) -> Option<OffsetDateTime> {
	let raw = raw.trim();

	OffsetDateTime::parse(raw, &Rfc3339)
		.ok()
		.or_else(|| parse_iso_date(raw).map(|date| day_window(date).0))
}

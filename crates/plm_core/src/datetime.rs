use crate::error::AppError;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Reads a timestamp as sent by the service. RFC 3339 values carry their own
/// offset; bare `YYYY-MM-DD HH:MM:SS` values are taken as local time.
pub fn parse_service_timestamp(
    raw: &str,
    local_offset: UtcOffset,
) -> Result<OffsetDateTime, AppError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }

    parse_local_datetime(trimmed)
        .map(|local| local.assume_offset(local_offset))
        .map_err(|_| AppError::invalid_data(format!("unrecognized timestamp '{trimmed}'")))
}

/// Parses user input: `YYYY-MM-DD HH:MM[:SS]`, the same with a `T`
/// separator, or a bare `YYYY-MM-DD` meaning midnight.
pub fn parse_local_datetime(raw: &str) -> Result<PrimitiveDateTime, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("datetime is required"));
    }

    let normalized = trimmed.replacen('T', " ", 1);
    if let Ok(parsed) = PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(parsed);
    }
    if let Ok(parsed) = PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
    ) {
        return Ok(parsed);
    }
    if let Ok(date) = Date::parse(&normalized, format_description!("[year]-[month]-[day]")) {
        return Ok(date.midnight());
    }

    Err(AppError::invalid_input(format!(
        "datetime '{trimmed}' must look like YYYY-MM-DD or YYYY-MM-DD HH:MM[:SS]"
    )))
}

/// `YYYY-MM-DD HH:MM:SS`, the format the task endpoints store.
pub fn format_service_timestamp(value: PrimitiveDateTime) -> Result<String, AppError> {
    value
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// `YYYY-MM-DDTHH:MM`, the format the field-info endpoints store.
pub fn format_form_timestamp(value: PrimitiveDateTime) -> Result<String, AppError> {
    value
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Applies the service's fixed display skew: the stored instant is moved by
/// the negated local UTC offset plus one hour and read back at the local
/// offset. The resulting wall clock is the stored UTC wall clock + 1h.
pub fn adjust_to_timezone(instant: OffsetDateTime, local_offset: UtcOffset) -> OffsetDateTime {
    let timezone_offset = Duration::seconds(-i64::from(local_offset.whole_seconds()));
    (instant + timezone_offset + Duration::HOUR).to_offset(local_offset)
}

/// Inverse of [`adjust_to_timezone`]: the local wall clock the service
/// originally stored for a corrected timestamp.
pub fn restore_local_datetime(
    adjusted: OffsetDateTime,
    local_offset: UtcOffset,
) -> PrimitiveDateTime {
    let timezone_offset = Duration::seconds(i64::from(local_offset.whole_seconds()));
    let stored = (adjusted - Duration::HOUR + timezone_offset).to_offset(local_offset);
    PrimitiveDateTime::new(stored.date(), stored.time())
}

/// The UTC wall clock of a service timestamp, as a form value.
pub fn utc_form_value(raw: &str, local_offset: UtcOffset) -> Result<String, AppError> {
    let instant = parse_service_timestamp(raw, local_offset)?.to_offset(UtcOffset::UTC);
    format_form_timestamp(PrimitiveDateTime::new(instant.date(), instant.time()))
}

//! Display strings shared by the table, the detail view and the exports.

use crate::summary::UNKNOWN_LABEL;
use time::OffsetDateTime;
use time::macros::format_description;

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// `dd.MM.yyyy, HH:mm`, as shown in the task table.
pub fn format_table_date(value: OffsetDateTime) -> String {
    value
        .format(format_description!(
            "[day].[month].[year], [hour]:[minute]"
        ))
        .unwrap_or_default()
}

/// `d.M.yyyy, HH:mm:ss`, as written to the export files.
pub fn format_export_date(value: OffsetDateTime) -> String {
    value
        .format(format_description!(
            "[day padding:none].[month padding:none].[year], [hour]:[minute]:[second]"
        ))
        .unwrap_or_default()
}

pub fn format_hectares(area: f64) -> String {
    format!("{area:.2}")
}

/// `x.xx ha`, or `-` when the size is unknown.
pub fn format_area(area: Option<f64>) -> String {
    match area {
        Some(area) => format!("{} ha", format_hectares(area)),
        None => "-".to_string(),
    }
}

pub fn format_performance(performance: Option<f64>) -> String {
    match performance {
        Some(value) => format!("{value:.2} ha/h"),
        None => UNKNOWN_LABEL.to_string(),
    }
}

pub fn format_rate(rate: Option<f64>, unit: &str) -> String {
    match rate {
        Some(value) => format!("{value:.2} {unit}"),
        None => format!("- {unit}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        format_area, format_duration, format_export_date, format_performance, format_rate,
        format_table_date,
    };
    use time::macros::datetime;

    #[test]
    fn durations_are_zero_padded() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3725), "01:02:05");
        assert_eq!(format_duration(90_061), "25:01:01");
    }

    #[test]
    fn dates_use_german_layouts() {
        let value = datetime!(2024-03-09 07:05:04 +1);
        assert_eq!(format_table_date(value), "09.03.2024, 07:05");
        assert_eq!(format_export_date(value), "9.3.2024, 07:05:04");
    }

    #[test]
    fn numbers_round_to_two_places() {
        assert_eq!(format_area(Some(2.345_6)), "2.35 ha");
        assert_eq!(format_area(None), "-");
        assert_eq!(format_performance(Some(1.5)), "1.50 ha/h");
        assert_eq!(format_performance(None), "Unbekannt");
        assert_eq!(format_rate(None, "h/ha"), "- h/ha");
    }
}

//! Formatting utilities using external crates where possible

use bytesize::ByteSize;
use num_format::{Locale, ToFormattedString};

/// Formatting utilities for consistent display patterns
pub struct FormatUtils;

impl FormatUtils {
    /// Format a percentage with consistent precision (1 decimal place)
    #[inline]
    pub fn format_percentage(value: f64) -> String {
        format!("{:.1}%", value)
    }

    /// Format a latency value with consistent precision (2 decimal places)
    #[inline]
    pub fn format_latency_ms(value: f64) -> String {
        format!("{:.2}ms", value)
    }

    /// Format a duration in milliseconds
    #[inline]
    pub fn format_duration_ms(ms: u64) -> String {
        format!("{}ms", ms)
    }

    /// Format a timeout message
    #[inline]
    pub fn format_timeout_message(timeout_ms: u64) -> String {
        format!("Timeout after {}ms", timeout_ms)
    }

    /// Format a score with consistent precision (1 decimal place)
    #[inline]
    pub fn format_score(score: f64) -> String {
        format!("{:.1}", score)
    }

    /// Format a timestamp for display
    #[inline]
    pub fn format_timestamp_display() -> String {
        crate::time_utils::TimeUtils::format_timestamp(&crate::time_utils::TimeUtils::now())
    }

    /// Format bytes in human readable format using bytesize crate
    #[inline]
    pub fn format_bytes(bytes: u64) -> String {
        ByteSize::b(bytes).to_string_as(true)
    }

    /// Format a count with thousands separator using num-format crate
    #[inline]
    pub fn format_count(count: usize) -> String {
        count.to_formatted_string(&Locale::en)
    }

    /// Format a count in compact form (K, M notation)
    pub fn format_count_compact(count: usize) -> String {
        if count >= 1_000_000 {
            format!("{:.1}M", count as f64 / 1_000_000.0)
        } else if count >= 1_000 {
            format!("{:.1}K", count as f64 / 1_000.0)
        } else {
            count.to_string()
        }
    }
}

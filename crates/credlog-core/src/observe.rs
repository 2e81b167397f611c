//! Optional metrics instrumentation for credlog.
//!
//! When the `observe` feature is enabled, reads, decodes, projections and
//! submissions emit counters and histograms via the [`metrics`] crate. A
//! downstream application must install a metrics recorder to collect them.
//!
//! When the feature is **not** enabled every function in this module is a
//! zero-cost no-op.

/// Record one page fetch.
///
/// - `credlog.reader.pages_total` – counter
/// - `credlog.reader.messages_total` – counter
/// - `credlog.reader.page_duration_seconds` – histogram
#[inline]
pub fn record_page_fetch(duration: std::time::Duration, messages: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("credlog.reader.pages_total").increment(1);
        metrics::counter!("credlog.reader.messages_total").increment(messages as u64);
        metrics::histogram!("credlog.reader.page_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, messages);
    }
}

/// Record a skipped topic entry.
///
/// - `credlog.decoder.skipped_total` – counter with `reason` label
#[inline]
pub fn record_decode_skip(reason: &'static str) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("credlog.decoder.skipped_total", "reason" => reason).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = reason;
    }
}

/// Record a projection fold.
///
/// - `credlog.projector.runs_total` – counter
/// - `credlog.projector.events_total` – counter
/// - `credlog.projector.run_duration_seconds` – histogram
#[inline]
pub fn record_projection(duration: std::time::Duration, events: usize) {
    #[cfg(feature = "observe")]
    {
        metrics::counter!("credlog.projector.runs_total").increment(1);
        metrics::counter!("credlog.projector.events_total").increment(events as u64);
        metrics::histogram!("credlog.projector.run_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, events);
    }
}

/// Record an event submission.
///
/// - `credlog.submit.total` – counter with `outcome` label
#[inline]
pub fn record_submit(success: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if success { "ok" } else { "fail" };
        metrics::counter!("credlog.submit.total", "outcome" => outcome).increment(1);
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = success;
    }
}

/// Record the outcome of a visibility wait.
///
/// - `credlog.visibility.waits_total` – counter with `outcome` label
/// - `credlog.visibility.wait_duration_seconds` – histogram
#[inline]
pub fn record_visibility_wait(duration: std::time::Duration, visible: bool) {
    #[cfg(feature = "observe")]
    {
        let outcome = if visible { "visible" } else { "not_yet_visible" };
        metrics::counter!("credlog.visibility.waits_total", "outcome" => outcome).increment(1);
        metrics::histogram!("credlog.visibility.wait_duration_seconds")
            .record(duration.as_secs_f64());
    }
    #[cfg(not(feature = "observe"))]
    {
        let _ = (duration, visible);
    }
}

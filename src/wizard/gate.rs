//! Scroll gate: decides when the service agreement counts as read.
//!
//! The agreement is read once ANY of three independent signals fires:
//! the (debounced) scroll position reaches the bottom, the sentinel at the
//! end of the content becomes visible, or the fallback timer elapses.
//! The gate is monotonic: once read it stays read until `reset`.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which signal satisfied the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadSignal {
    ScrolledToBottom,
    SentinelVisible,
    FallbackElapsed,
}

/// Gate tuning.
#[derive(Debug, Clone, Copy)]
pub struct GateConfig {
    /// Distance from the bottom, in pixels, that still counts as "at bottom".
    pub bottom_threshold_px: f64,
    /// Quiet period after the last scroll event before the position is checked.
    pub scroll_debounce: Duration,
    /// Fraction of the sentinel that must be visible.
    pub sentinel_ratio: f64,
    /// Time after which the gate opens regardless of scrolling.
    pub fallback_after: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            bottom_threshold_px: 100.0,
            scroll_debounce: Duration::from_millis(100),
            sentinel_ratio: 0.8,
            fallback_after: Duration::from_secs(30),
        }
    }
}

/// Scroll geometry of the agreement container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, client_height: f64, scroll_height: f64) -> Self {
        Self {
            scroll_top,
            client_height,
            scroll_height,
        }
    }

    /// Within `threshold_px` of the bottom. Content that fits without
    /// scrolling is trivially at the bottom.
    pub fn is_near_bottom(&self, threshold_px: f64) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - threshold_px
    }
}

/// Intersection signal: enough of the sentinel is visible.
pub fn sentinel_visible(intersection_ratio: f64, required_ratio: f64) -> bool {
    intersection_ratio > 0.0 && intersection_ratio >= required_ratio
}

/// Fallback signal: the gate has been open long enough.
pub fn fallback_elapsed(opened_at: Instant, now: Instant, after: Duration) -> bool {
    now.saturating_duration_since(opened_at) >= after
}

/// Monotonic OR of the three read signals.
#[derive(Debug, Clone)]
pub struct ScrollGate {
    config: GateConfig,
    opened_at: Instant,
    pending_scroll: Option<(Instant, ScrollMetrics)>,
    satisfied_by: Option<ReadSignal>,
}

impl ScrollGate {
    pub fn new(config: GateConfig, now: Instant) -> Self {
        Self {
            config,
            opened_at: now,
            pending_scroll: None,
            satisfied_by: None,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Start over, e.g. when the agreement is shown again.
    pub fn reset(&mut self, now: Instant) {
        self.opened_at = now;
        self.pending_scroll = None;
        self.satisfied_by = None;
    }

    pub fn is_read(&self) -> bool {
        self.satisfied_by.is_some()
    }

    pub fn satisfied_by(&self) -> Option<ReadSignal> {
        self.satisfied_by
    }

    fn satisfy(&mut self, signal: ReadSignal) {
        if self.satisfied_by.is_none() {
            debug!(signal = ?signal, "Service agreement marked as read");
            self.satisfied_by = Some(signal);
        }
    }

    /// Immediate position check, used on first render.
    pub fn check_position(&mut self, metrics: ScrollMetrics) -> bool {
        if metrics.is_near_bottom(self.config.bottom_threshold_px) {
            self.satisfy(ReadSignal::ScrolledToBottom);
        }
        self.is_read()
    }

    /// Record a scroll event. The position is evaluated by `tick` once
    /// the debounce period has passed without further scrolling.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, now: Instant) {
        self.pending_scroll = Some((now, metrics));
    }

    /// Record an intersection observation of the bottom sentinel.
    pub fn on_sentinel(&mut self, intersection_ratio: f64) -> bool {
        if sentinel_visible(intersection_ratio, self.config.sentinel_ratio) {
            self.satisfy(ReadSignal::SentinelVisible);
        }
        self.is_read()
    }

    /// Advance time: flush a settled scroll and check the fallback timer.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some((at, metrics)) = self.pending_scroll {
            if now.saturating_duration_since(at) >= self.config.scroll_debounce {
                self.pending_scroll = None;
                self.check_position(metrics);
            }
        }
        if fallback_elapsed(self.opened_at, now, self.config.fallback_after) {
            self.satisfy(ReadSignal::FallbackElapsed);
        }
        self.is_read()
    }
}

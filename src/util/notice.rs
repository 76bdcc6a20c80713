//! Auto-dismissing success/error banners.
//!
//! DESIGN
//! ======
//! A notice is stamped with the instant it was shown and a time-to-live;
//! visibility is computed from `now`, so no timer has to be cancelled when
//! the owning view goes away. Success banners last 1 s, errors 3 s.

#[cfg(test)]
#[path = "notice_test.rs"]
mod tests;

use std::time::{Duration, Instant};

pub const SUCCESS_TTL: Duration = Duration::from_secs(1);
pub const ERROR_TTL: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    #[must_use]
    pub fn ttl(self) -> Duration {
        match self {
            Self::Success => SUCCESS_TTL,
            Self::Error => ERROR_TTL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub shown_at: Instant,
    pub ttl: Duration,
}

impl Notice {
    #[must_use]
    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.ttl
    }
}

/// At most one live notice per kind; a new one replaces the old.
#[derive(Clone, Debug, Default)]
pub struct NoticeBoard {
    success: Option<Notice>,
    error: Option<Notice>,
}

impl NoticeBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, kind: NoticeKind, message: impl Into<String>, now: Instant) {
        let notice = Notice { kind, message: message.into(), shown_at: now, ttl: kind.ttl() };
        match kind {
            NoticeKind::Success => self.success = Some(notice),
            NoticeKind::Error => self.error = Some(notice),
        }
    }

    pub fn success(&mut self, message: impl Into<String>, now: Instant) {
        self.show(NoticeKind::Success, message, now);
    }

    pub fn error(&mut self, message: impl Into<String>, now: Instant) {
        self.show(NoticeKind::Error, message, now);
    }

    /// Notices still on screen at `now`; expired ones are dropped.
    pub fn visible(&mut self, now: Instant) -> Vec<&Notice> {
        for slot in [&mut self.success, &mut self.error] {
            if slot.as_ref().is_some_and(|n| !n.is_visible(now)) {
                *slot = None;
            }
        }
        self.success.iter().chain(self.error.iter()).collect()
    }

    /// The `isError` flag: true while an error banner is showing.
    pub fn is_error(&mut self, now: Instant) -> bool {
        self.visible(now).iter().any(|n| n.kind == NoticeKind::Error)
    }

    pub fn clear(&mut self) {
        self.success = None;
        self.error = None;
    }
}

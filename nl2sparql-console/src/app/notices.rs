use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub shown_at: DateTime<Utc>,
}

/// Single-slot notice area. A new notice replaces the current one; a notice
/// disappears once its display time has passed.
#[derive(Debug)]
pub struct NoticeBoard {
    ttl: Duration,
    current: Mutex<Option<Notice>>,
}

impl NoticeBoard {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::milliseconds(ttl.as_millis() as i64),
            current: Mutex::new(None),
        }
    }

    pub fn show(&self, kind: NoticeKind, text: impl Into<String>, now: DateTime<Utc>) -> Notice {
        let notice = Notice {
            kind,
            text: text.into(),
            shown_at: now,
        };
        *self.current.lock() = Some(notice.clone());
        notice
    }

    pub fn current(&self, now: DateTime<Utc>) -> Option<Notice> {
        let mut slot = self.current.lock();
        if let Some(notice) = slot.as_ref() {
            if now - notice.shown_at >= self.ttl {
                *slot = None;
            }
        }
        slot.clone()
    }

    pub fn dismiss(&self) {
        self.current.lock().take();
    }
}

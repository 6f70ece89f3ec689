use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel, duration: Duration) -> Self {
        Self {
            message: message.into(),
            level,
            expires_at: Instant::now() + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Latest status-bar message. A new message replaces the previous one.
#[derive(Debug)]
pub struct StatusLine {
    current: Option<Notification>,
    default_duration: Duration,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::with_default_duration(Duration::from_secs(4))
    }
}

impl StatusLine {
    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            current: None,
            default_duration,
        }
    }

    pub fn notify(&mut self, message: impl Into<String>, level: NotificationLevel) {
        let notification = Notification::new(message, level, self.default_duration);
        log::debug!("Status: {}", notification.message);
        self.current = Some(notification);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Info);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationLevel::Error);
    }

    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    /// Drops the message once expired, returns true if it was dropped
    pub fn update(&mut self) -> bool {
        if self.current.as_ref().is_some_and(Notification::is_expired) {
            self.current = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_message_replaces_previous() {
        let mut status = StatusLine::default();
        status.info("first");
        status.error("second");
        let current = status.current().unwrap();
        assert_eq!(current.message, "second");
        assert_eq!(current.level, NotificationLevel::Error);
    }

    #[test]
    fn expired_message_is_cleared() {
        let mut status = StatusLine::with_default_duration(Duration::ZERO);
        status.warn("gone soon");
        assert!(status.update());
        assert!(status.current().is_none());
        assert!(!status.update());
    }
}

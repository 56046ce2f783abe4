use chrono::{DateTime, Utc};

///
/// An overridable clock.
///
/// The lockout window is pure arithmetic over 'now', so tests pin the clock
/// to a fixed instant and travel through the window rather than sleeping.
///
#[derive(Debug, Default)]
pub struct TimeProvider {
    fixed: Option<DateTime<Utc>>
}

impl TimeProvider {
    pub fn now(&self) -> DateTime<Utc> {
        match self.fixed {
            Some(fixed) => fixed,
            None => Utc::now()
        }
    }

    pub fn fix(&mut self, fixed: Option<DateTime<Utc>>) {
        self.fixed = fixed;
    }
}

pub mod message;
pub mod notification;
pub mod room;
pub mod session;
pub mod user;

pub use message::*;
pub use notification::*;
pub use room::*;
pub use session::*;
pub use user::*;

use chrono::{SecondsFormat, Utc};

/// Current time as a fixed-width RFC3339 string (microsecond precision).
/// Fixed width keeps lexicographic order identical to chronological order,
/// which message listing relies on.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

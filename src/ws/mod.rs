pub mod chat;
pub mod frames;
pub mod hub;
pub mod notifications;

pub use frames::{InboundFrame, OutboundFrame};
pub use hub::{notification_group, Hub};

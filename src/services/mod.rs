pub mod identity;
pub mod message_pipeline;
pub mod notifier;
pub mod responder;
pub mod room_service;

pub use identity::IdentityService;
pub use message_pipeline::MessagePipeline;
pub use notifier::{FcmPushProvider, MockPushProvider, NotificationDispatcher, PushProvider};
pub use responder::{
    needs_escalation, HttpTextGenerator, MockTextGenerator, ResponderService, TextGenerator,
    FALLBACK_REPLY,
};
pub use room_service::RoomService;

#![allow(dead_code)]

pub mod fixtures;
pub mod test_db;

pub use fixtures::*;
pub use test_db::*;

use std::sync::Arc;
use std::time::Duration;

use helpline::database::Database;
use helpline::services::{
    MessagePipeline, NotificationDispatcher, PushProvider, ResponderService, RoomService,
    TextGenerator,
};
use helpline::ws::hub::Hub;

pub struct TestServices {
    pub hub: Arc<Hub>,
    pub notifier: Arc<NotificationDispatcher>,
    pub rooms: Arc<RoomService>,
    pub pipeline: Arc<MessagePipeline>,
}

/// Wire the service graph the way main.rs does, with injectable doubles for
/// the external collaborators.
pub fn build_services(
    db: &Database,
    generator: Arc<dyn TextGenerator>,
    push: Arc<dyn PushProvider>,
) -> TestServices {
    let hub = Arc::new(Hub::new());
    let notifier = Arc::new(NotificationDispatcher::new(db.clone(), hub.clone(), push));
    let responder = Arc::new(ResponderService::new(generator, Duration::from_secs(1)));
    let pipeline = Arc::new(MessagePipeline::new(
        db.clone(),
        hub.clone(),
        responder,
        notifier.clone(),
    ));
    let rooms = Arc::new(RoomService::new(db.clone(), notifier.clone()));

    TestServices {
        hub,
        notifier,
        rooms,
        pipeline,
    }
}

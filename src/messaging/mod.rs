// Messaging - lock-free channels from the editor core to its observers
//
// Graph change events feed UI refresh; notifications feed the user-visible
// message panel. Both are ringbuffers created once at startup.

pub mod channels;
pub mod event;
pub mod notification;

pub use channels::{
    EventConsumer, EventProducer, NotificationConsumer, NotificationProducer,
    create_event_channel, create_notification_channel,
};
pub use event::GraphEvent;
pub use notification::{Notification, NotificationCategory, NotificationLevel};

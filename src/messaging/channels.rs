// Communication channels lock-free

use crate::messaging::event::GraphEvent;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub type EventProducer = ringbuf::HeapProd<GraphEvent>;
pub type EventConsumer = ringbuf::HeapCons<GraphEvent>;

pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<GraphEvent>::new(capacity);
    rb.split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

// Communication channels
//
// Presentation -> tick loop: lock-free SPSC ring, polled by the loop every slice.
// Tick loop -> presentation: unbounded crossbeam channel, so no event is dropped
// and the presentation side can block with a timeout.

use crate::messaging::command::EngineCommand;
use crate::messaging::event::SessionEvent;
use ringbuf::{HeapRb, traits::Split};

pub type CommandProducer = ringbuf::HeapProd<EngineCommand>;
pub type CommandConsumer = ringbuf::HeapCons<EngineCommand>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<EngineCommand>::new(capacity);
    rb.split()
}

pub type EventSender = crossbeam::channel::Sender<SessionEvent>;
pub type EventReceiver = crossbeam::channel::Receiver<SessionEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    crossbeam::channel::unbounded()
}

// Messaging - the only paths between the tick loop and the presentation layer

pub mod channels;
pub mod command;
pub mod event;

pub use channels::{EventReceiver, EventSender, create_command_channel, create_event_channel};
pub use command::EngineCommand;
pub use event::{EventPump, SessionEvent, SessionObserver, dispatch_event};

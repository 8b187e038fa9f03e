pub mod dispatcher;

pub use dispatcher::{spawn_log_consumer, ChannelDispatcher, LogDispatcher, NotificationDispatcher};

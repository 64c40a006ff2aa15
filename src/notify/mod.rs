//! Placement change notifications

pub mod discord;
pub mod dispatcher;
pub mod message;

pub use discord::DiscordRestDelivery;
pub use dispatcher::{DeliveryChannel, NotificationDispatcher, Notifier};
pub use message::{format_announcement, ordinal, pluralize, Direction, NotificationPayload, PlacementChange};

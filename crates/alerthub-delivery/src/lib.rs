//! # alerthub-delivery
//!
//! Stateless fan-out of notification messages across delivery channels.
//! Each channel is a [`channels::ChannelSender`] registered with the
//! [`dispatcher::DeliveryDispatcher`]; the dispatcher records a per-channel
//! result for every send.

pub mod channels;
pub mod dispatcher;
pub mod message;
pub mod priority;

pub use channels::ChannelSender;
pub use dispatcher::{DeliveryDispatcher, DispatchReport};
pub use message::{OutboundMessage, Recipient};
pub use priority::DeliveryPriority;

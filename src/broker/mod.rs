pub mod client;
pub mod protocol;

pub use client::{AccountSummary, BrokerClient, BrokerPosition, Contract, OpenOrder, OrderStatus, PlacedOrder};

//! # Event subscribers for the nsvisor runtime.
//!
//! Subscribers are the supervisor's **explicit diagnostic sink**: they are
//! passed in at construction and receive every [`Event`](crate::Event)
//! published on the internal [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! LoopActor ── publish(Event) ──► Bus ──► event_listener (Supervisor)
//!                                              │
//!                                              ├──► SubscriberSet::emit(&Event)
//!                                              │         │
//!                                              │    ┌────┴────┬─────────┐
//!                                              │    ▼         ▼         ▼
//!                                              │  LogWriter  Metrics  Custom
//!                                              │
//!                                              └──► AliveTracker (running loops)
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

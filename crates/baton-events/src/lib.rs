//! Baton event plumbing
//!
//! This crate builds two independent notification components on top of
//! [`baton_sync::FairMutex`]:
//! - [`NotificationRouter`]: topic-keyed publish/subscribe with per-handler
//!   failure isolation
//! - [`DeferredEventQueue`]: FIFO buffer of callbacks flushed under a lock
//!
//! Neither is a global singleton. An application that wants one router per
//! process holds it in its own static or passes it around by `Arc`:
//!
//! ```ignore
//! use baton_events::{Handler, NotificationRouter};
//! use once_cell::sync::Lazy;
//!
//! static ROUTER: Lazy<NotificationRouter<String>> = Lazy::new(NotificationRouter::new);
//!
//! let greet = Handler::new(|name: &String| println!("hello {name}"));
//! ROUTER.subscribe("greet", &greet)?;
//! ROUTER.send("greet", &"world".to_string())?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod deferred;
pub mod error;
pub mod handler;
pub mod router;

pub use config::{FailureLevel, QueueConfig, RouterConfig};
pub use deferred::DeferredEventQueue;
pub use error::{HandlerError, QueueError, RouterError};
pub use handler::{Handler, HandlerId};
pub use router::{Dispatch, NotificationRouter};

//! Core data types for the listings sniper.

pub mod collection;
pub mod diff;
pub mod event;
pub mod market;

pub use collection::*;
pub use diff::*;
pub use event::*;
pub use market::*;

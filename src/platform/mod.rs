//! Platform abstraction layer
//!
//! Maps browser events (keyboard, touch buttons) onto simulation input.
//! Nothing here touches `web_sys`; the harness feeds plain key names and
//! timestamps so the mapping is testable natively.

pub mod input;

pub use input::{InputController, Key};

//! Feeding one dispatcher from several producers
//!
//! Covers the inbox (channel into a single dispatcher thread), the async `serve` loop and
//! the lock-protected `SharedDispatcher`.

mod serve;
mod shared;

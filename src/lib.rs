//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the decoder
//! features of `core-playback`. Host applications can depend on
//! `pcm-workspace` and enable the documented features without needing to wire
//! each crate individually.

pub use core_playback;

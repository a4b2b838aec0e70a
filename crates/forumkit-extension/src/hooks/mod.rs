//! Action/filter hook system.

pub mod bus;
pub mod names;

pub use bus::{ActionCallback, FilterCallback, HookBus, HookKind, HookValue};
pub use bus::{action_fn, filter_fn};

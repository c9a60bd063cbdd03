//! Post events and the in-process bus that carries them to projections.

pub mod bus;
pub mod event;
pub mod projection;

pub use bus::{EventBus, Handler, HandlerError, HandlerResult, PostEventBus};
pub use event::{Event, EventKind, PostEvent};
pub use projection::Projection;

//! Domain model (ids, message, payload, handle state).

pub mod ids;
pub mod message;
pub mod payload;
pub mod state;

pub use ids::{MessageId, ReservationId};
pub use message::{Delivery, QueueMessage, marshal_push};
pub use payload::Payload;
pub use state::{HandleState, Settlement};

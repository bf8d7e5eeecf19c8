//! Host side of the JLMap bridge.
//!
//! A [`MapSession`] owns the transport, the id → handle registry and the event
//! dispatcher. A [`Bridge`] wraps a session and exposes the two endpoints the
//! embedded engine calls: `jlObjectBridgeCall` and `eventHandler`.

pub mod bridge;
pub mod methods;
pub mod pending;
pub mod registry;
pub mod session;

pub use bridge::Bridge;
pub use methods::{BridgeMethod, BridgeVerb};
pub use pending::{CorrelationId, PendingCall};
pub use registry::ObjectRegistry;
pub use session::MapSession;

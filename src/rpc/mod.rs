//! RPC surface: envelopes, method routing and the per-connection session.

mod dispatcher;
mod envelope;
mod session;

pub use dispatcher::{Dispatcher, OneWay, Route, TwoWay};
pub use envelope::{Request, Response};
pub use session::{Session, SessionState};

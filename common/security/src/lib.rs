pub mod context;
pub mod policy;

pub use context::{Authorized, SecurityContext, SecurityCtxExtractor, TraceId};
pub use policy::{gate, Capability, Gate};

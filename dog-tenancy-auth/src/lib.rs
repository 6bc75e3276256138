//! dog-tenancy-auth: session propagation for dog-tenancy.
//!
//! Tokens embed `roles`, `tenants` and `activeTenant` from the persisted
//! actor, are rejected once that state moves on, and are reissued by the
//! tenant switch.

pub mod claims;
pub mod jwt;
pub mod options;
pub mod session;
pub mod store;
pub mod switch;

pub use claims::SessionClaims;
pub use jwt::*;
pub use options::*;
pub use session::{authenticate, ensure_fresh, STALE_SESSION};
pub use store::{ActorStore, MemoryActorStore};
pub use switch::{SwitchOutcome, TenantSwitcher};

//! # haul-auth
//!
//! Client-side session gate for Haulage.
//!
//! Resolves the signed-in identity and its role (cache first, then the
//! hosted backend), publishes the result through an [`AuthContext`], gates
//! screens with a [`RoleGuard`], and keeps a best-effort presence
//! [`ActivityHeartbeat`] running while a session is active.
//!
//! ```text
//! SessionCache ─┐
//! RemoteBackend ─┴─> SessionResolver ─> AuthContext ─> RoleGuard
//!                                           └──────── ActivityHeartbeat
//! ```

pub mod cache;
pub mod clock;
pub mod context;
pub mod error;
pub mod guard;
pub mod heartbeat;
pub mod memory;
pub mod remote;
pub mod resolver;
pub mod rest;
pub mod token_store;

pub use cache::{CachedSession, SessionCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{AuthContext, AuthSnapshot};
pub use error::AuthError;
pub use guard::{GuardDecision, GuardEffects, GuardRoutes, RoleGuard, decide};
pub use heartbeat::{ActivityHeartbeat, ActivitySignal};
pub use memory::MemoryBackend;
pub use remote::RemoteBackend;
pub use resolver::{Resolution, ResolvedSession, SessionResolver, SessionSource};
pub use rest::RestBackend;
pub use token_store::{TokenSource, TokenStore};

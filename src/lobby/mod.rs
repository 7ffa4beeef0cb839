//! Lobby membership management
//!
//! This module holds the lobby state machine, the registry that keys lobbies
//! by chat, request validation, and the locked manager every transport uses.

pub mod instance;
pub mod manager;
pub mod registry;
pub mod validation;

// Re-export commonly used types
pub use instance::{JoinEffect, LeaveEffect, LobbyInstance};
pub use manager::{LobbyManager, LobbyManagerStats};
pub use registry::{LobbyKey, SessionRegistry, StartEffect};
pub use validation::{validate_membership_request, MembershipRequest};

//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::auth::SessionTokenIssuer;
use crate::infrastructure::invite::InvitationService;
use crate::infrastructure::storage::Store;
use crate::infrastructure::user::IdentityService;

/// Application state shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub identity: Arc<IdentityService>,
    pub invitations: Arc<InvitationService>,
    /// Validates bearer tokens for the authentication gate
    pub tokens: Arc<dyn SessionTokenIssuer>,
    pub store: Store,
}

impl AppState {
    pub fn new(
        identity: IdentityService,
        invitations: InvitationService,
        tokens: Arc<dyn SessionTokenIssuer>,
        store: Store,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            invitations: Arc::new(invitations),
            tokens,
            store,
        }
    }
}

//! Caller identity flags shared by commands.

use clap::Args;
use ragdesk_knowledge::UserIdentity;

/// The already-authenticated caller on whose behalf a command runs.
#[derive(Args, Debug, Clone)]
pub struct IdentityArgs {
    /// User identifier
    #[arg(long = "user", env = "RAGDESK_USER")]
    pub user_id: String,

    /// Tenant the user belongs to
    #[arg(long = "tenant", env = "RAGDESK_TENANT")]
    pub tenant_id: String,

    /// Role name (executive, manager, accounting, site_manager, sales, staff)
    #[arg(long, env = "RAGDESK_ROLE", default_value = "staff")]
    pub role: String,

    /// Extra permission (repeatable), e.g. cost:view or docs:cost_pdf
    #[arg(long = "permission")]
    pub permissions: Vec<String>,

    /// Store the user is assigned to
    #[arg(long = "store")]
    pub store_id: Option<String>,

    /// Act as a tenant administrator
    #[arg(long)]
    pub admin: bool,
}

impl IdentityArgs {
    pub fn to_identity(&self) -> UserIdentity {
        let mut identity = UserIdentity::new(&self.user_id, &self.tenant_id, &self.role)
            .with_permissions(self.permissions.iter().cloned());
        if let Some(store_id) = &self.store_id {
            identity = identity.with_store(store_id);
        }
        if self.admin {
            identity = identity.admin();
        }
        identity
    }
}

//! Office 365 connection model.

use serde::{Deserialize, Serialize};

/// Link between a local account and an Office 365 account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Local username (the one used to sign into the site)
    pub username: String,
    /// Office 365 account email address
    pub user_email: String,
    /// Access token for `outlook_resource_id`, empty until first refresh
    pub access_token: String,
    pub refresh_token: String,
    /// Resource ID for Outlook services (usually https://outlook.office365.com/)
    pub outlook_resource_id: String,
    /// API endpoint for Outlook services (usually https://outlook.office365.com/api/v1.0)
    pub outlook_api_endpoint: String,
    /// When the account was connected (ISO 8601)
    pub connected_at: String,
}

impl Connection {
    /// True when a refresh is needed before calling the API.
    pub fn needs_access_token(&self) -> bool {
        self.access_token.is_empty()
    }
}

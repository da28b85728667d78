//! Signed-in identity attached to a session

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Identity returned by the OAuth provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Provider-side account id
    pub id: String,
    pub display_name: String,
    pub emails: Vec<String>,
    pub photos: Vec<String>,
    pub provider: String,
}

/// Current user as exposed by `/auth/user`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub photo: String,
}

impl From<&Principal> for UserInfo {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.clone(),
            display_name: principal.display_name.clone(),
            email: principal
                .emails
                .first()
                .cloned()
                .unwrap_or_else(|| "No email".to_string()),
            photo: principal
                .photos
                .first()
                .cloned()
                .unwrap_or_else(|| "No photo".to_string()),
        }
    }
}

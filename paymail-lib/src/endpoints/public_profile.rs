//! Public profile lookup.

use serde::{Deserialize, Serialize};

use crate::client::{PaymailClient, StandardResponse};
use crate::errors::ResponseResult;

/// Name and avatar published for a paymail.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfilePayload {
    /// Avatar image URL.
    #[serde(default)]
    pub avatar: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Response from a public profile lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublicProfileResponse {
    pub standard: StandardResponse,
    pub payload: PublicProfilePayload,
}

paymail_response!(PublicProfileResponse, PublicProfilePayload);

impl PaymailClient {
    /// Fetch the public profile for `alias@domain`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, profile_url)))]
    pub async fn get_public_profile(
        &self,
        profile_url: &str,
        alias: &str,
        domain: &str,
    ) -> ResponseResult<PublicProfileResponse> {
        let url = self.endpoint_url(profile_url, alias, domain)?;
        let standard = self.get_request(&url).await?;
        Self::decode_response(standard, &format!("{}@{}", alias, domain))
    }
}

//! Credential store port
//!
//! Per-organization gateway secrets (API key, webhook signing secret) live
//! in an encrypted-at-rest store owned by an external collaborator; this
//! port exposes only the decrypt-and-fetch operations the gateway domain
//! needs. Secrets are wrapped in [`SecretString`] so they never land in
//! debug output or logs.

use async_trait::async_trait;
use secrecy::SecretString;

use core_kernel::{DomainPort, OrganizationId, PortError};

/// Read-only access to decrypted gateway credentials
#[async_trait]
pub trait CredentialStore: DomainPort {
    /// Returns the organization's gateway API key
    async fn gateway_api_key(
        &self,
        organization_id: OrganizationId,
    ) -> Result<SecretString, PortError>;

    /// Returns the organization's webhook signing secret
    async fn webhook_secret(
        &self,
        organization_id: OrganizationId,
    ) -> Result<SecretString, PortError>;
}

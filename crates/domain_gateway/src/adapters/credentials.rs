//! Static credential store
//!
//! A `CredentialStore` configured at startup: one default key pair, with
//! optional per-organization overrides. Suitable for single-tenant
//! deployments and tests; a multi-tenant deployment would back this port
//! with an encrypted credential service instead.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;

use core_kernel::{DomainPort, OrganizationId, PortError};

use crate::credentials::CredentialStore;

/// One organization's gateway credentials
#[derive(Clone)]
struct OrgCredentials {
    api_key: SecretString,
    webhook_secret: SecretString,
}

/// In-process credential store with a default key pair and per-organization
/// overrides
#[derive(Clone)]
pub struct StaticCredentialStore {
    default: OrgCredentials,
    overrides: HashMap<OrganizationId, OrgCredentials>,
}

impl StaticCredentialStore {
    /// Creates a store that serves the given credentials for every
    /// organization
    pub fn new(api_key: SecretString, webhook_secret: SecretString) -> Self {
        Self {
            default: OrgCredentials {
                api_key,
                webhook_secret,
            },
            overrides: HashMap::new(),
        }
    }

    /// Registers organization-specific credentials
    pub fn with_organization(
        mut self,
        organization_id: OrganizationId,
        api_key: SecretString,
        webhook_secret: SecretString,
    ) -> Self {
        self.overrides.insert(
            organization_id,
            OrgCredentials {
                api_key,
                webhook_secret,
            },
        );
        self
    }

    fn credentials_for(&self, organization_id: OrganizationId) -> &OrgCredentials {
        self.overrides.get(&organization_id).unwrap_or(&self.default)
    }
}

impl DomainPort for StaticCredentialStore {}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn gateway_api_key(
        &self,
        organization_id: OrganizationId,
    ) -> Result<SecretString, PortError> {
        Ok(self.credentials_for(organization_id).api_key.clone())
    }

    async fn webhook_secret(
        &self,
        organization_id: OrganizationId,
    ) -> Result<SecretString, PortError> {
        Ok(self.credentials_for(organization_id).webhook_secret.clone())
    }
}

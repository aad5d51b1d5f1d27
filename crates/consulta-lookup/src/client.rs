//! The lookup client trait.

use crate::outcome::LookupOutcome;
use async_trait::async_trait;
use consulta_core::NormalizedIdentifier;

/// One call per identifier against the external lookup service.
///
/// Implementations must be thread-safe (Send + Sync): the bulk scheduler shares
/// one client across every concurrent call of a wave.
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Look up a single normalized identifier.
    ///
    /// Never fails: absence is [`LookupOutcome::NotFound`] and transport
    /// problems are [`LookupOutcome::TransportFailure`].
    async fn lookup(&self, identifier: &NormalizedIdentifier) -> LookupOutcome;

    /// Get the unique identifier for this client, used in logs.
    fn client_id(&self) -> &str;
}

//! Certificate management commands.
//!
//! ```bash
//! qacart-cli certificate revoke user-1_playwright --reason "chargeback"
//! ```

use qacart_core::CertificateId;
use qacart_storefront::db::PgStore;
use qacart_storefront::services::{CertificateService, CertificateSettings};

use super::{CommandError, connect};

/// Revoke an issued certificate.
///
/// Revoking an already revoked certificate is a no-op.
///
/// # Errors
///
/// Returns `CommandError` if the certificate does not exist or the store fails.
pub async fn revoke(id: &str, reason: Option<String>) -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);
    // Settings only affect issuance.
    let settings = CertificateSettings::default();
    let service = CertificateService::new(&store, &settings);

    let certificate = service
        .revoke_certificate(&CertificateId::new(id), reason)
        .await?;

    tracing::info!(
        certificate_id = %certificate.id,
        certificate_number = %certificate.certificate_number,
        "Certificate is revoked"
    );
    Ok(())
}

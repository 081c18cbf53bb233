//! macOS Keychain lookup for provider credentials.
//!
//! Reads generic password items, the same items
//! `security add-generic-password -a <account> -s <service> -w <token>`
//! creates.

#![cfg(target_os = "macos")]

use security_framework::passwords::get_generic_password;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{ProviderError, Result};

/// errSecItemNotFound
const ITEM_NOT_FOUND: i32 = -25300;
/// errSecUserCanceled
const USER_CANCELED: i32 = -128;

/// Read a generic password item, `None` if it does not exist.
///
/// # Errors
///
/// `ProviderError::PermissionDenied` if access was refused, or
/// `ProviderError::Backend` for any other Keychain failure.
pub(super) fn generic_password(
    service: &str,
    account: &str,
) -> Result<Option<Zeroizing<String>>> {
    match get_generic_password(service, account) {
        Ok(bytes) => {
            let bytes = Zeroizing::new(bytes);
            let text = std::str::from_utf8(&bytes).map_err(|_| {
                ProviderError::DecryptionFailed(format!(
                    "keychain item {} is not valid UTF-8",
                    service
                ))
            })?;
            debug!(service = %service, "keychain item found");
            Ok(Some(Zeroizing::new(text.trim_end().to_string())))
        }
        Err(e) if e.code() == ITEM_NOT_FOUND => {
            debug!(service = %service, "keychain item not found");
            Ok(None)
        }
        Err(e) if e.code() == USER_CANCELED => Err(ProviderError::PermissionDenied(format!(
            "keychain access to {} was denied",
            service
        ))
        .into()),
        Err(e) => Err(ProviderError::Backend(format!("keychain: {}", e)).into()),
    }
}

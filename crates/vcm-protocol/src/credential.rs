//! WiFi credential extraction from `a40802` frames.
//!
//! Layout: `02 02 00 00 | n | n credential bytes | trailer`. The trailer is
//! kept but not interpreted.

use std::fmt;

use crate::error::{CredentialDefect, ProtocolResult};

const CREDENTIAL_PREFIX: [u8; 4] = [0x02, 0x02, 0x00, 0x00];

#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredential {
    secret: String,
    trailer: Vec<u8>,
}

impl WifiCredential {
    /// The credential string; non-UTF-8 bytes are replaced.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn trailer(&self) -> &[u8] {
        &self.trailer
    }

    /// Length of the credential in bytes, safe to log.
    pub fn len(&self) -> usize {
        self.secret.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }
}

// Keep the secret out of logs.
impl fmt::Debug for WifiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredential")
            .field("secret", &"<redacted>")
            .field("len", &self.secret.len())
            .field("trailer", &hex::encode(&self.trailer))
            .finish()
    }
}

/// Extract the length-prefixed credential from a credential frame payload.
///
/// # Errors
///
/// Returns [`crate::ProtocolError::MalformedCredential`] when the payload
/// lacks the command prefix or the length byte, or when the declared length
/// runs past the end of the payload.
pub fn extract_credential(data: &[u8]) -> ProtocolResult<WifiCredential> {
    let rest = data
        .strip_prefix(CREDENTIAL_PREFIX.as_slice())
        .ok_or(CredentialDefect::MissingPrefix)?;
    let (&declared, rest) = rest.split_first().ok_or(CredentialDefect::MissingLength)?;
    let declared = usize::from(declared);

    let (secret, trailer) = rest.split_at_checked(declared).ok_or(CredentialDefect::Overrun {
        declared,
        available: rest.len(),
    })?;

    Ok(WifiCredential {
        secret: String::from_utf8_lossy(secret).into_owned(),
        trailer: trailer.to_vec(),
    })
}

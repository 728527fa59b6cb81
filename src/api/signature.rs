//! Verification of the `SignatureCEK` header the voice platform attaches to
//! every extension request: a base64 RSA-SHA256 (PKCS#1 v1.5) signature over
//! the raw request body.

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use derive_more::{Display, Error, From};
use rsa::{Pkcs1v15Sign, RsaPublicKey, pkcs8::DecodePublicKey};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::Config;

pub const SIGNATURE_HEADER: &str = "SignatureCEK";

#[derive(Debug, Display, From, Error)]
pub enum SignatureError {
    #[display(fmt = "missing {} header", SIGNATURE_HEADER)]
    #[from(ignore)]
    Missing,
    #[display(fmt = "signature is not valid base64: {}", _0)]
    Encoding(base64::DecodeError),
    #[display(fmt = "signature does not match body: {}", _0)]
    Mismatch(rsa::Error),
}

pub enum SignatureCheck {
    Verify(RsaPublicKey),
    /// Local debugging only
    Disabled,
}

impl SignatureCheck {
    pub fn from_pem(pem: &str) -> anyhow::Result<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem.trim())
            .context("CEK public key is not a PEM encoded RSA key")?;
        Ok(SignatureCheck::Verify(key))
    }

    pub fn check(&self, signature: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        let key = match self {
            SignatureCheck::Verify(key) => key,
            SignatureCheck::Disabled => return Ok(()),
        };

        let signature = STANDARD.decode(signature.ok_or(SignatureError::Missing)?.trim())?;
        let hashed = Sha256::digest(body);
        key.verify(Pkcs1v15Sign::new::<Sha256>(), &hashed, &signature)?;
        Ok(())
    }
}

/// Reads the platform key from `CEK_PUBLIC_KEY_PATH`, or downloads it from
/// `CEK_PUBLIC_KEY_URL`.
pub async fn load(config: &Config) -> anyhow::Result<SignatureCheck> {
    if config.skip_signature_check {
        warn!("SKIP_SIGNATURE_CHECK is set, requests are not authenticated");
        return Ok(SignatureCheck::Disabled);
    }

    let pem = match config.cek_public_key_path.as_deref() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CEK public key from {}", path))?,
        None => {
            info!(url = %config.cek_public_key_url, "Fetching CEK public key");
            reqwest::get(&config.cek_public_key_url)
                .await?
                .error_for_status()?
                .text()
                .await
                .context("Failed to download CEK public key")?
        }
    };

    SignatureCheck::from_pem(&pem)
}

//! TOTP engine - time-based one-time passwords over HMAC-SHA1.
//!
//! Codes are 6 digits on 30-second steps with RFC 4226 dynamic truncation.
//! Verification accepts a drift window of two steps either side (±60 s) and
//! compares candidates in constant time.

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::utils::base32;

type HmacSha1 = Hmac<Sha1>;

/// 160-bit secrets, the size authenticator apps expect (32 base32 chars).
const SECRET_BYTES: usize = 20;
const STEP_SECONDS: i64 = 30;
const DRIFT_STEPS: i64 = 2;

/// Enrollment material handed to the user during two-factor setup.
#[derive(Debug, Clone)]
pub struct TotpEnrollment {
    pub secret: String,
    pub provisioning_uri: String,
}

#[derive(Clone)]
pub struct TotpEngine {
    issuer: String,
}

impl TotpEngine {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// Generate a fresh secret and the otpauth URI for authenticator apps.
    ///
    /// The URI layout (label, parameter order, casing) is wire contract;
    /// authenticator apps parse it as a QR code.
    pub fn generate_secret(&self, account: &str) -> TotpEnrollment {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let secret = base32::encode(&bytes);

        let provisioning_uri = format!(
            "otpauth://totp/{}:{}?secret={}&issuer={}",
            self.issuer, account, secret, self.issuer
        );

        TotpEnrollment {
            secret,
            provisioning_uri,
        }
    }

    /// Compute the 6-digit code for one time step.
    ///
    /// HMAC-SHA1 over the 8-byte big-endian counter, then dynamic
    /// truncation: the low nibble of the last digest byte picks a 31-bit
    /// big-endian word, reduced mod 10^6.
    pub fn compute_code(&self, secret: &str, time_step: u64) -> Result<String, anyhow::Error> {
        let key = base32::decode(secret);
        let mut mac = HmacSha1::new_from_slice(&key)
            .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;

        mac.update(&time_step.to_be_bytes());
        let digest = mac.finalize().into_bytes();

        let offset = (digest[19] & 0x0f) as usize;
        let value = (u32::from(digest[offset] & 0x7f) << 24)
            | (u32::from(digest[offset + 1]) << 16)
            | (u32::from(digest[offset + 2]) << 8)
            | u32::from(digest[offset + 3]);

        Ok(format!("{:06}", value % 1_000_000))
    }

    /// Verify a presented code against the current time step.
    ///
    /// Mutates nothing; replay protection within the window is not this
    /// layer's job.
    pub fn verify(&self, secret: &str, presented_code: &str) -> bool {
        self.verify_at(secret, presented_code, Utc::now().timestamp())
    }

    /// Verify a presented code at an explicit Unix timestamp.
    pub fn verify_at(&self, secret: &str, presented_code: &str, unix_seconds: i64) -> bool {
        let current_step = unix_seconds / STEP_SECONDS;

        for step in (current_step - DRIFT_STEPS)..=(current_step + DRIFT_STEPS) {
            if step < 0 {
                continue;
            }
            let candidate = match self.compute_code(secret, step as u64) {
                Ok(candidate) => candidate,
                Err(_) => return false,
            };

            let candidate_bytes = candidate.as_bytes();
            let presented_bytes = presented_code.as_bytes();
            if candidate_bytes.len() == presented_bytes.len()
                && bool::from(candidate_bytes.ct_eq(presented_bytes))
            {
                return true;
            }
        }

        false
    }
}

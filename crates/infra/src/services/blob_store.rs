use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Resolves attachment blob references to urls the recipient can fetch
pub trait IBlobStore: Send + Sync {
    /// `now` is the current timestamp in millis
    fn signed_url(&self, blob_ref: &str, now: i64) -> anyhow::Result<String>;
}

/// Produces expiring urls signed with HMAC-SHA256
pub struct SignedUrlBlobStore {
    base_url: String,
    bucket: String,
    expires_secs: i64,
    secret: String,
}

impl SignedUrlBlobStore {
    pub fn new(base_url: String, bucket: String, expires_secs: i64, secret: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            expires_secs,
            secret,
        }
    }

    fn sign(&self, object: &str, expires: i64) -> anyhow::Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| anyhow::Error::msg(e.to_string()))?;
        mac.update(format!("{}:{}", object, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl IBlobStore for SignedUrlBlobStore {
    fn signed_url(&self, blob_ref: &str, now: i64) -> anyhow::Result<String> {
        let blob_ref = blob_ref.trim_start_matches('/');
        if blob_ref.trim().is_empty() {
            return Err(anyhow::Error::msg("Empty blob reference"));
        }
        let object = format!("{}/{}", self.bucket, blob_ref);
        let expires = now / 1000 + self.expires_secs;
        let signature = self.sign(&object, expires)?;

        let mut url = url::Url::parse(&format!("{}/{}", self.base_url, object))?;
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);
        Ok(url.to_string())
    }
}

//! HMAC-SHA256 与 base64url 编解码辅助函数。

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// 用签名密钥构造可复用的 MAC 实例（每次签名/校验前 clone）。
pub(crate) fn keyed_mac(secret: &[u8]) -> Result<HmacSha256, InvalidLength> {
    HmacSha256::new_from_slice(secret)
}

/// base64url（无填充）编码。
pub(crate) fn b64url_encode(raw: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(raw)
}

/// base64url（无填充）解码；格式非法返回 `None`。
pub(crate) fn b64url_decode(encoded: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(encoded.as_bytes()).ok()
}

/// HMAC-SHA256 并输出 base64url。
pub(crate) fn hmac_b64url(keyed: &HmacSha256, payload: &[u8]) -> String {
    let mut mac = keyed.clone();
    mac.update(payload);
    b64url_encode(&mac.finalize().into_bytes())
}

/// 常量时间校验 HMAC-SHA256 签名。
pub(crate) fn hmac_verify(keyed: &HmacSha256, payload: &[u8], signature: &[u8]) -> bool {
    let mut mac = keyed.clone();
    mac.update(payload);
    mac.verify_slice(signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::{b64url_decode, hmac_b64url, hmac_verify, keyed_mac};

    #[test]
    fn signature_verifies_only_under_same_key_and_payload() {
        let key = keyed_mac(b"secret").unwrap();
        let other = keyed_mac(b"other").unwrap();

        let sig = hmac_b64url(&key, b"payload");
        assert!(!sig.contains('='));
        let raw = b64url_decode(&sig).unwrap();
        assert_eq!(raw.len(), 32);
        assert!(hmac_verify(&key, b"payload", &raw));
        assert!(!hmac_verify(&other, b"payload", &raw));
        assert!(!hmac_verify(&key, b"payload!", &raw));
    }

    #[test]
    fn truncated_signature_is_rejected() {
        let key = keyed_mac(b"secret").unwrap();
        let raw = b64url_decode(&hmac_b64url(&key, b"payload")).unwrap();
        assert!(!hmac_verify(&key, b"payload", &raw[..16]));
    }

    #[test]
    fn padded_input_is_not_valid_b64url() {
        assert!(b64url_decode("YQ==").is_none());
        assert_eq!(b64url_decode("YQ").unwrap(), b"a");
    }
}

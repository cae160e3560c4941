// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HMAC-SHA256 signatures for Shipwatch webhook traffic.
//!
//! Carriers that push status updates sign the raw request body and send the
//! result in [`SIGNATURE_HEADER`] as `sha256=<hex>`. Outbound callback
//! deliveries to a monitor's `callback_url` are signed the same way so the
//! receiving application can verify them with the shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature on inbound webhooks and outbound callbacks.
pub const SIGNATURE_HEADER: &str = "X-Shipwatch-Signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Hex-encoded HMAC-SHA256 of `payload`, without prefix.
pub fn sign_payload(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

/// Header value for `payload`: `sha256=<hex>`.
pub fn signature_header_value(secret: &[u8], payload: &[u8]) -> String {
	format!("{SIGNATURE_PREFIX}{}", sign_payload(secret, payload))
}

/// Verify a `sha256=<hex>` header value against `payload`.
///
/// Comparison is constant-time. Missing prefix or malformed hex fails closed.
pub fn verify_signature_header(secret: &[u8], payload: &[u8], header_value: &str) -> bool {
	let Some(hex_sig) = header_value.trim().strip_prefix(SIGNATURE_PREFIX) else {
		return false;
	};

	let Ok(expected) = hex::decode(hex_sig) else {
		return false;
	};

	let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
		return false;
	};

	mac.update(payload);
	mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	const SECRET: &[u8] = b"carrier-shared-secret";
	const BODY: &[u8] = br#"{"tracking_number":"NQ1","status":"in_transit"}"#;

	#[test]
	fn test_sign_payload_is_hex_sha256() {
		let sig = sign_payload(SECRET, BODY);
		assert_eq!(sig.len(), 64);
		assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn test_header_value_has_prefix() {
		let header = signature_header_value(SECRET, BODY);
		assert!(header.starts_with("sha256="));
		assert_eq!(&header[7..], sign_payload(SECRET, BODY));
	}

	#[test]
	fn test_verify_accepts_own_signature() {
		let header = signature_header_value(SECRET, BODY);
		assert!(verify_signature_header(SECRET, BODY, &header));
	}

	#[test]
	fn test_verify_tolerates_surrounding_whitespace() {
		let header = format!("  {}  ", signature_header_value(SECRET, BODY));
		assert!(verify_signature_header(SECRET, BODY, &header));
	}

	#[test]
	fn test_verify_rejects_missing_prefix() {
		let bare = sign_payload(SECRET, BODY);
		assert!(!verify_signature_header(SECRET, BODY, &bare));
	}

	#[test]
	fn test_verify_rejects_bad_hex() {
		assert!(!verify_signature_header(SECRET, BODY, "sha256=zz-not-hex"));
	}

	#[test]
	fn test_verify_rejects_wrong_secret() {
		let header = signature_header_value(SECRET, BODY);
		assert!(!verify_signature_header(b"other-secret", BODY, &header));
	}

	#[test]
	fn test_verify_rejects_tampered_body() {
		let header = signature_header_value(SECRET, BODY);
		let tampered = br#"{"tracking_number":"NQ1","status":"delivered"}"#;
		assert!(!verify_signature_header(SECRET, tampered, &header));
	}
}

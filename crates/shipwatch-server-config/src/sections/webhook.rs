// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Signing secrets for inbound carrier webhooks and outbound callbacks.

use serde::Deserialize;
use std::fmt;

#[derive(Clone, Default, PartialEq)]
pub struct WebhookConfig {
	/// When set, inbound webhooks must carry a valid signature.
	pub secret: Option<String>,
	/// When set, outbound callback-URL deliveries are signed.
	pub callback_signing_secret: Option<String>,
}

impl fmt::Debug for WebhookConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebhookConfig")
			.field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
			.field(
				"callback_signing_secret",
				&self.callback_signing_secret.as_ref().map(|_| "[REDACTED]"),
			)
			.finish()
	}
}

#[derive(Clone, Default, Deserialize)]
pub struct WebhookConfigLayer {
	#[serde(default)]
	pub secret: Option<String>,
	#[serde(default)]
	pub callback_signing_secret: Option<String>,
}

impl fmt::Debug for WebhookConfigLayer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebhookConfigLayer")
			.field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
			.field(
				"callback_signing_secret",
				&self.callback_signing_secret.as_ref().map(|_| "[REDACTED]"),
			)
			.finish()
	}
}

impl WebhookConfigLayer {
	pub fn merge(&mut self, other: WebhookConfigLayer) {
		if other.secret.is_some() {
			self.secret = other.secret;
		}
		if other.callback_signing_secret.is_some() {
			self.callback_signing_secret = other.callback_signing_secret;
		}
	}

	pub fn finalize(self) -> WebhookConfig {
		WebhookConfig {
			secret: self.secret.filter(|s| !s.is_empty()),
			callback_signing_secret: self.callback_signing_secret.filter(|s| !s.is_empty()),
		}
	}
}

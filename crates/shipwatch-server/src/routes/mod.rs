// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod alerts;
pub mod engine;
pub mod health;
pub mod monitors;
pub mod webhooks;

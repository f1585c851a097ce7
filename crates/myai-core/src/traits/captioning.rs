// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image captioning collaborator.

use async_trait::async_trait;

use crate::error::MyaiError;
use crate::traits::adapter::PluginAdapter;

#[async_trait]
pub trait ImageCaptioner: PluginAdapter {
    /// Captions encoded image bytes. With `prompt`, the caption continues
    /// that text (conditional captioning).
    async fn caption(&self, image: &[u8], prompt: Option<&str>) -> Result<String, MyaiError>;
}

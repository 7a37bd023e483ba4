// Attachment encoder - addresses attachments for testMetadata messages
// https://www.jetbrains.com/help/teamcity/reporting-test-metadata.html

use std::path::{MAIN_SEPARATOR, Path};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::model::{Attachment, AttachmentBody};

/// Directory name that marks the start of the published artifact tree
const RESULTS_MARKER: &str = "test-results";

/// `type` attribute of a testMetadata message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataType {
    Artifact,
    Text,
}

impl MetadataType {
    pub fn for_content_type(content_type: &str) -> Self {
        match content_type {
            "image/png" | "application/zip" => Self::Artifact,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artifact => "artifact",
            Self::Text => "text",
        }
    }
}

/// Encoded attachment, ready to become testMetadata attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAttachment {
    pub kind: MetadataType,
    pub name: String,
    pub value: String,
}

/// Encode an attachment relative to the artifact root.
///
/// File attachments become a path under `artifacts` (`artifacts.zip!/...` when
/// the root is an archive); in-memory bodies are base64 encoded.
pub fn encode(attachment: &Attachment, artifacts: &str) -> EncodedAttachment {
    let value = match &attachment.body {
        AttachmentBody::Path(path) => artifact_path(path, artifacts),
        AttachmentBody::Bytes(bytes) => STANDARD.encode(bytes),
    };

    EncodedAttachment {
        kind: MetadataType::for_content_type(&attachment.content_type),
        name: attachment.name.clone(),
        value,
    }
}

fn artifact_path(path: &Path, artifacts: &str) -> String {
    let normalized = path.to_string_lossy().replace(MAIN_SEPARATOR, "/");

    let relative = match normalized.find(RESULTS_MARKER) {
        Some(index) => {
            // Drop the marker and the separator right after it
            let mut rest = normalized[index + RESULTS_MARKER.len()..].chars();
            rest.next();
            rest.as_str().to_string()
        }
        None => normalized.trim_start_matches('/').to_string(),
    };

    let archive = if artifacts.ends_with(".zip") { "!" } else { "" };
    format!("{}{}/{}", artifacts, archive, relative)
}

use crate::ports::outbound::ContentSource;
use crate::shared::Result;
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub const SPDX_LICENSES_URI: &str = "https://spdx.org/licenses/licenses.json";
pub const SPDX_EXCEPTIONS_URI: &str = "https://spdx.org/licenses/exceptions.json";

#[derive(Debug, Deserialize)]
struct LicenseList {
    #[serde(default)]
    licenses: Vec<LicenseEntry>,
}

#[derive(Debug, Deserialize)]
struct LicenseEntry {
    #[serde(rename = "licenseId")]
    license_id: String,
    name: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct ExceptionList {
    #[serde(default)]
    exceptions: Vec<ExceptionEntry>,
}

#[derive(Debug, Deserialize)]
struct ExceptionEntry {
    #[serde(rename = "licenseExceptionId")]
    license_exception_id: String,
    name: String,
    reference: String,
}

/// SPDX license and exception index: identifier or display name to reference URL.
///
/// Built once per run and shared read-only by every enrichment task.
/// Lookups are exact and case-sensitive; a later entry with the same key
/// replaces an earlier one.
#[derive(Debug, Clone, Default)]
pub struct LicenseRegistry {
    ids: HashMap<String, String>,
    names: HashMap<String, String>,
}

impl LicenseRegistry {
    /// Fetches both SPDX documents concurrently and indexes them.
    pub async fn load<C: ContentSource + ?Sized>(
        content: &C,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let (licenses, exceptions) = futures::try_join!(
            content.fetch(SPDX_LICENSES_URI, cancel),
            content.fetch(SPDX_EXCEPTIONS_URI, cancel)
        )?;
        Self::from_documents(&licenses, &exceptions)
    }

    pub fn from_documents(licenses: &[u8], exceptions: &[u8]) -> Result<Self> {
        let licenses: LicenseList =
            serde_json::from_slice(licenses).context("Invalid SPDX license list")?;
        let exceptions: ExceptionList =
            serde_json::from_slice(exceptions).context("Invalid SPDX exception list")?;

        let mut registry = Self::default();
        for entry in licenses.licenses {
            registry.insert(entry.license_id, entry.name, entry.reference);
        }
        for entry in exceptions.exceptions {
            registry.insert(entry.license_exception_id, entry.name, entry.reference);
        }
        tracing::debug!(
            ids = registry.ids.len(),
            names = registry.names.len(),
            "Loaded SPDX license registry"
        );
        Ok(registry)
    }

    fn insert(&mut self, id: String, name: String, reference: String) {
        self.ids.insert(id, reference.clone());
        self.names.insert(name, reference);
    }

    /// Reference URL for an SPDX identifier, or failing that a display name.
    pub fn lookup(&self, id_or_name: &str) -> Option<&str> {
        self.ids
            .get(id_or_name)
            .or_else(|| self.names.get(id_or_name))
            .map(String::as_str)
    }

    pub fn is_valid_id(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

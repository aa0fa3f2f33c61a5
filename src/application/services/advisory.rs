use crate::ports::outbound::ContentSource;
use crate::sbom_generation::domain::{Component, ExternalReferenceType};
use crate::shared::error::FetchError;
use crate::shared::Result;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

pub const OSV_QUERY_URI: &str = "https://api.osv.dev/v1/query";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    vulns: Vec<Vulnerability>,
}

#[derive(Debug, Deserialize)]
struct Vulnerability {
    #[serde(default)]
    references: Vec<Reference>,
}

#[derive(Debug, Deserialize)]
struct Reference {
    #[serde(rename = "type")]
    kind: String,
    url: String,
}

fn reference_type(kind: &str) -> ExternalReferenceType {
    match kind {
        "ADVISORY" => ExternalReferenceType::Advisories,
        "WEB" => ExternalReferenceType::Website,
        "PACKAGE" => ExternalReferenceType::Vcs,
        _ => ExternalReferenceType::Other,
    }
}

/// Attaches vulnerability references reported by OSV for the component's purl.
///
/// Lookup failures are logged and leave the component unchanged; only
/// cancellation is returned as an error.
pub async fn attach_advisories<C: ContentSource + ?Sized>(
    content: &C,
    component: &mut Component,
    cancel: &CancellationToken,
) -> Result<()> {
    let Some(purl) = component.purl.clone() else {
        return Ok(());
    };
    let body = serde_json::json!({ "package": { "purl": purl } }).to_string();
    let response = match content
        .post(
            OSV_QUERY_URI,
            &[("Content-Type", "application/json")],
            &body,
            cancel,
        )
        .await
    {
        Ok(response) => response,
        Err(FetchError::Canceled) => return Err(FetchError::Canceled.into()),
        Err(e) => {
            tracing::warn!(purl = %purl, error = %e, "Advisory lookup failed");
            return Ok(());
        }
    };

    match serde_json::from_str::<QueryResponse>(&response) {
        Ok(response) => {
            for reference in response.vulns.into_iter().flat_map(|v| v.references) {
                component.add_external_reference(reference_type(&reference.kind), reference.url);
            }
        }
        Err(e) => tracing::warn!(purl = %purl, error = %e, "Invalid advisory response"),
    }
    Ok(())
}

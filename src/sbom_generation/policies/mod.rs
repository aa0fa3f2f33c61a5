mod expected_missing;
mod license_evidence;
mod redirections;

pub use expected_missing::ExpectedMissingPatterns;
pub use license_evidence::{
    KnownLicense, LicenseEvidencePolicy, LicenseMap, APACHE_20, EDL_10, EPL_10, EPL_20,
    INDETERMINATE,
};
pub use redirections::UriRedirections;

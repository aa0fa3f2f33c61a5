use p2_sbom::adapters::outbound::network::ContentCache;
use p2_sbom::application::services::license_registry::{SPDX_EXCEPTIONS_URI, SPDX_LICENSES_URI};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

use super::mocks::MockHttpTransport;

pub const SPDX_LICENSES: &str = r#"{
  "licenseListVersion": "3.24",
  "licenses": [
    {"licenseId": "EPL-2.0", "name": "Eclipse Public License 2.0", "reference": "https://spdx.org/licenses/EPL-2.0.html"},
    {"licenseId": "Apache-2.0", "name": "Apache License 2.0", "reference": "https://spdx.org/licenses/Apache-2.0.html"},
    {"licenseId": "MIT", "name": "MIT License", "reference": "https://spdx.org/licenses/MIT.html"}
  ]
}"#;

pub const SPDX_EXCEPTIONS: &str = r#"{
  "exceptions": [
    {"licenseExceptionId": "Classpath-exception-2.0", "name": "Classpath exception 2.0", "reference": "https://spdx.org/licenses/Classpath-exception-2.0.html"}
  ]
}"#;

/// Transport serving the SPDX license and exception lists.
pub fn spdx_transport() -> MockHttpTransport {
    MockHttpTransport::new()
        .with_body(SPDX_LICENSES_URI, SPDX_LICENSES)
        .with_body(SPDX_EXCEPTIONS_URI, SPDX_EXCEPTIONS)
}

/// Writes the SPDX documents into a cache directory so runs need no network.
pub fn seed_spdx_cache(cache_dir: &Path) {
    let cache = ContentCache::new(MockHttpTransport::new(), cache_dir.to_path_buf());
    for (uri, body) in [
        (SPDX_LICENSES_URI, SPDX_LICENSES),
        (SPDX_EXCEPTIONS_URI, SPDX_EXCEPTIONS),
    ] {
        let path = cache.cache_path(uri, None);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }
}

/// Builds an in-memory zip from (name, content) pairs.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

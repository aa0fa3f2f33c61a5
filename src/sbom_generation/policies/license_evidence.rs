use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Name recorded for a license URL found without any naming evidence.
pub const INDETERMINATE: &str = "indeterminate";

/// A license recognized from well-known text or a well-known file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownLicense {
    pub url: &'static str,
    pub name: &'static str,
}

pub const EPL_10: KnownLicense = KnownLicense {
    url: "https://www.eclipse.org/legal/epl-v10.html",
    name: "EPL-1.0",
};
pub const EPL_20: KnownLicense = KnownLicense {
    url: "https://www.eclipse.org/legal/epl-v20.html",
    name: "EPL-2.0",
};
pub const EDL_10: KnownLicense = KnownLicense {
    url: "https://www.eclipse.org/org/documents/edl-v10.html",
    name: "EDL-1.0",
};
pub const APACHE_20: KnownLicense = KnownLicense {
    url: "https://www.apache.org/licenses/LICENSE-2.0",
    name: "Apache-2.0",
};
const APACHE_11: KnownLicense = KnownLicense {
    url: "http://www.apache.org/licenses/LICENSE-1.1",
    name: "Apache-1.1",
};
const LGPL_21: KnownLicense = KnownLicense {
    url: "https://spdx.org/licenses/LGPL-2.1-only.html",
    name: "LGPL-2.1-only",
};
const BSD_0: KnownLicense = KnownLicense {
    url: "https://spdx.org/licenses/0BSD.html",
    name: "0BSD",
};
const IPL_10: KnownLicense = KnownLicense {
    url: "https://spdx.org/licenses/IPL-1.0.html",
    name: "IBM Public License v1.0",
};

static ACCEPTED_LICENSE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^.*(documents/epl-v10|epl-v20|legal|license|/MPL).*[^/]$")
        .expect("valid accepted-license pattern")
});
static POTENTIAL_LICENSE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href=['"]https?://(.*?)[/\r\n ]*['"]"#).expect("valid href pattern")
});
static EPL_10_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^epl-?(1.0|v10).*.html?$").expect("valid EPL 1.0 pattern"));
static EPL_20_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^epl-?(2.0|v20).*.html?$").expect("valid EPL 2.0 pattern"));
static EDL_10_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^edl-?(1.0|v10).*.html?$").expect("valid EDL pattern"));
static APACHE_20_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Apache License\s+\*?\s*Version 2.0, January 2004\s+\*?\s*http://www.apache.org/licenses/",
    )
    .expect("valid Apache pattern")
});
static LGPL_21_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*GNU LESSER GENERAL PUBLIC LICENSE\s+Version 2\.1, February 1999")
        .expect("valid LGPL pattern")
});
static SPDX_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"SPDX-License-Identifier:\s((with\r?\n|[^\r\n"\\|#])+)"#)
        .expect("valid SPDX tag pattern")
});
static SPDX_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+OR\s+|\s+AND\s+|\s+WITH\s+|\s+with\s+").expect("valid operator pattern")
});
static LINK_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *, *").expect("valid separator pattern"));

/// URL-keyed license evidence; a `None` name means the URL was found without naming evidence.
///
/// Iteration is URL-sorted. A `None` never replaces an existing name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicenseMap(BTreeMap<String, Option<String>>);

impl LicenseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, url: impl Into<String>, name: Option<String>) {
        let url = url.into();
        match name {
            Some(name) => {
                self.0.insert(url, Some(name));
            }
            None => {
                self.0.entry(url).or_insert(None);
            }
        }
    }

    pub fn put_known(&mut self, license: KnownLicense) {
        self.put(license.url, Some(license.name.to_string()));
    }

    pub fn get(&self, url: &str) -> Option<Option<&str>> {
        self.0.get(url).map(|name| name.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(url, name)| (url.as_str(), name.as_deref()))
    }
}

/// Rules that turn archive content into license evidence.
pub struct LicenseEvidencePolicy;

impl LicenseEvidencePolicy {
    /// License implied by a well-known license file name at the archive root.
    pub fn license_for_file_name(name: &str) -> Option<KnownLicense> {
        if EDL_10_NAME.is_match(name) {
            Some(EDL_10)
        } else if EPL_20_NAME.is_match(name) {
            Some(EPL_20)
        } else if EPL_10_NAME.is_match(name) {
            Some(EPL_10)
        } else {
            None
        }
    }

    /// License recognized from a fixed text fingerprint.
    pub fn fingerprint(content: &str) -> Option<KnownLicense> {
        if APACHE_20_TEXT.is_match(content) {
            Some(APACHE_20)
        } else if LGPL_21_TEXT.is_match(content) {
            Some(LGPL_21)
        } else if content.contains("The Apache Software License, Version 1.1") {
            Some(APACHE_11)
        } else if content.starts_with("BSD License") {
            Some(BSD_0)
        } else if content.starts_with("# Eclipse Public License - v 2.0")
            || content.starts_with("Eclipse Public License - v 2.0")
        {
            Some(EPL_20)
        } else if content.contains("IBM Public License Version 1.0") {
            Some(IPL_10)
        } else {
            None
        }
    }

    /// Every `SPDX-License-Identifier:` expression in the text, trimmed.
    pub fn spdx_expressions(content: &str) -> Vec<String> {
        SPDX_ID
            .captures_iter(content)
            .filter_map(|captures| captures.get(1))
            .map(|m| m.as_str().trim().to_string())
            .collect()
    }

    /// Splits a compound SPDX expression into its license ids.
    pub fn split_expression(expression: &str) -> Vec<String> {
        let stripped = expression.replace(['(', ')'], "");
        SPDX_OPERATOR
            .split(&stripped)
            .map(str::to_string)
            .collect()
    }

    /// Classifies every `href` found in an about document.
    ///
    /// Returns (accepted, rejected) URLs. Schema references are neither.
    pub fn about_references(content: &str) -> (Vec<String>, Vec<String>) {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for captures in POTENTIAL_LICENSE_REFERENCE.captures_iter(content) {
            let url = format!("https://{}", &captures[1]);
            if ACCEPTED_LICENSE_URL.is_match(&url) {
                accepted.push(url);
            } else if !url.ends_with(".xsd") && !url.ends_with(".dtd") {
                rejected.push(url);
            }
        }
        (accepted, rejected)
    }

    /// Licenses named in prose by an about document.
    pub fn about_markers(content: &str) -> Vec<(&'static str, &'static str)> {
        let mut markers = Vec::new();
        if content.contains("Eclipse Distribution License - v 1.0")
            || content.contains("Eclipse Distribution License - Version 1.0")
        {
            markers.push((EDL_10.url, "edl-v10"));
        }
        if content.contains("Eclipse Public License Version 2.0") {
            markers.push((EPL_20.url, EPL_20.name));
        }
        markers
    }

    /// Bundle-License values that map directly to a known license.
    pub fn bundle_license_shortcut(header: &str) -> Option<KnownLicense> {
        match header {
            "Eclipse Public License v2.0"
            | "Eclipse Public License, Version 2.0;link=\"http://www.eclipse.org/legal/epl-2.0\"" => {
                Some(EPL_20)
            }
            "Eclipse Public License v1.0" => Some(EPL_10),
            "The Apache License, Version 2.0" => Some(APACHE_20),
            _ => None,
        }
    }

    /// Rewrites Bundle-License values that do not parse as OSGi clauses.
    pub fn normalize_bundle_license(header: &str) -> &str {
        match header {
            "Apache License, Version 2.0; see: http://www.apache.org/licenses/LICENSE-2.0.txt" => {
                "Apache-2.0;location=http://www.apache.org/licenses/LICENSE-2.0.txt"
            }
            other => other,
        }
    }

    /// Repairs malformed license locations found in Bundle-License values.
    pub fn normalize_license_location(value: &str) -> String {
        if value.starts_with("://") {
            format!("https{}", value)
        } else if value == "jquery.com/license/" || value == "jquery.org/license" {
            format!("https://{}", value)
        } else {
            value.to_string()
        }
    }

    /// Splits a comma-separated URL list.
    pub fn split_urls(value: &str) -> Vec<String> {
        LINK_SEPARATOR
            .split(value)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }
}

use std::collections::BTreeMap;

/// Main-section headers of a `META-INF/MANIFEST.MF` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    headers: BTreeMap<String, String>,
}

impl Manifest {
    /// Parses the main section, joining continuation lines (those starting with a space).
    pub fn parse(text: &str) -> Self {
        let mut headers = BTreeMap::new();
        let mut current: Option<(String, String)> = None;
        for line in text.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                // End of the main section.
                break;
            }
            if let Some(continuation) = line.strip_prefix(' ') {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(continuation);
                }
                continue;
            }
            if let Some((name, value)) = current.take() {
                headers.insert(name, value);
            }
            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim_start().to_string()));
            }
        }
        if let Some((name, value)) = current {
            headers.insert(name, value);
        }
        Self { headers }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// `Bundle-ClassPath` entries that are nested jars.
    pub fn nested_jar_paths(&self) -> Vec<String> {
        self.get("Bundle-ClassPath")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| entry.ends_with(".jar"))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One clause of an OSGi header: `value;attr=x;dir:=y`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderClause {
    pub value: String,
    pub attributes: Vec<(String, String)>,
    pub directives: Vec<(String, String)>,
}

impl HeaderClause {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Splits on `separator` outside double quotes.
fn split_unquoted(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == separator && !quoted {
            parts.push(&text[start..index]);
            start = index + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
        .to_string()
}

/// Parses an OSGi manifest header into clauses.
pub fn parse_header(header: &str) -> Vec<HeaderClause> {
    split_unquoted(header, ',')
        .into_iter()
        .filter(|clause| !clause.trim().is_empty())
        .map(|clause| {
            let mut parsed = HeaderClause::default();
            let mut values = Vec::new();
            for part in split_unquoted(clause, ';') {
                let part = part.trim();
                if let Some((key, value)) = part.split_once(":=") {
                    parsed
                        .directives
                        .push((key.trim().to_string(), unquote(value)));
                } else if let Some((key, value)) = part.split_once('=').filter(|_| !values.is_empty()) {
                    parsed
                        .attributes
                        .push((key.trim().to_string(), unquote(value)));
                } else {
                    values.push(unquote(part));
                }
            }
            parsed.value = values.join(";");
            parsed
        })
        .collect()
}

/// Parses a header made of `key="value"` pairs, e.g. `Bundle-SCM`.
pub fn parse_key_values(header: &str) -> Vec<(String, String)> {
    split_unquoted(header, ',')
        .into_iter()
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), unquote(value)))
        .collect()
}

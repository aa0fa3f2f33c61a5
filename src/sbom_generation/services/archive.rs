use crate::shared::Result;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

/// Contents of a zip archive keyed by entry name. Directory entries are skipped.
pub type ArchiveEntries = BTreeMap<String, Vec<u8>>;

/// Result of comparing a local artifact with its canonical counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivalence {
    pub equivalent: bool,
    pub differences: Vec<String>,
}

/// Zip inspection and content comparison of artifacts.
pub struct ArchiveInspector;

impl ArchiveInspector {
    /// True when the bytes start with a zip local file header.
    pub fn is_zip(bytes: &[u8]) -> bool {
        bytes.len() > 4 && bytes.starts_with(b"PK\x03\x04")
    }

    pub fn entries(bytes: &[u8]) -> Result<ArchiveEntries> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = ArchiveEntries::new();
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            entries.insert(file.name().to_string(), content);
        }
        Ok(entries)
    }

    /// Visits entries in archive order without collecting them.
    pub fn for_each_entry<F>(bytes: &[u8], mut visit: F) -> Result<()>
    where
        F: FnMut(&str, &[u8]) -> Result<()>,
    {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            visit(&name, &content)?;
        }
        Ok(())
    }

    /// Compares two artifacts.
    ///
    /// Identical bytes are equivalent. Two zip archives are equivalent when
    /// their entry maps are equal, otherwise every differing entry produces a
    /// note. Other content is only equivalent when byte-identical.
    pub fn compare(local: &[u8], canonical: &[u8]) -> Result<Equivalence> {
        if local == canonical {
            return Ok(Equivalence {
                equivalent: true,
                differences: Vec::new(),
            });
        }
        if !Self::is_zip(local) || !Self::is_zip(canonical) {
            return Ok(Equivalence {
                equivalent: false,
                differences: Vec::new(),
            });
        }

        let local_entries = Self::entries(local)?;
        let canonical_entries = Self::entries(canonical)?;
        let differences = Self::differences(&local_entries, &canonical_entries);
        Ok(Equivalence {
            equivalent: differences.is_empty(),
            differences,
        })
    }

    fn differences(local: &ArchiveEntries, canonical: &ArchiveEntries) -> Vec<String> {
        let mut differences = Vec::new();
        for (name, content) in local {
            match canonical.get(name) {
                None => differences.push(format!("Added {}", name)),
                Some(other) if other != content => differences.push(format!("Modified {}", name)),
                Some(_) => {}
            }
        }
        for name in canonical.keys() {
            if !local.contains_key(name) {
                differences.push(format!("Removed {}", name));
            }
        }
        differences
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

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
}

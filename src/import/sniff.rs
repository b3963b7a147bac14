//! Cheap prefix-based format detection.
//!
//! A [`SniffContext`] carries a bounded, lossily decoded prefix of the
//! input. Sniffers only look for a root-element signature and a namespace
//! substring; they never parse and never fail.

use std::path::Path;

/// Default number of bytes inspected when sniffing (256 KiB).
pub const DEFAULT_SNIFF_LIMIT: usize = 256 * 1024;

/// Input handed to every sniffer.
#[derive(Clone, Debug, Default)]
pub struct SniffContext {
    /// Best-effort UTF-8 decoding of the byte prefix.
    pub sniff_text: String,
    /// Raw byte prefix.
    pub sniff_bytes: Vec<u8>,
    pub file_name: String,
    /// Lowercase extension without the dot.
    pub extension: Option<String>,
    pub mime_type: Option<String>,
}

impl SniffContext {
    /// Build a context from the start of a file.
    pub fn from_bytes(bytes: &[u8], file_name: &str, mime_type: Option<&str>, limit: usize) -> Self {
        let prefix = &bytes[..bytes.len().min(limit)];
        Self {
            sniff_text: String::from_utf8_lossy(prefix).into_owned(),
            sniff_bytes: prefix.to_vec(),
            file_name: file_name.to_string(),
            extension: Path::new(file_name)
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase),
            mime_type: mime_type.map(str::to_string),
        }
    }

    /// Build a context from text (tests, in-memory inputs).
    pub fn from_text(text: &str, file_name: &str) -> Self {
        Self::from_bytes(text.as_bytes(), file_name, None, DEFAULT_SNIFF_LIMIT)
    }

    /// Whether the prefix contains `needle` anywhere.
    pub fn contains(&self, needle: &str) -> bool {
        self.sniff_text.contains(needle)
    }

    /// Whether the prefix contains `needle`, ignoring ASCII case.
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.sniff_text
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase())
    }

    /// Whether the first element of the document has local name `local`
    /// (with or without prefix).
    pub fn root_is(&self, local: &str) -> bool {
        first_element_name(&self.sniff_text)
            .map(|name| crate::import::xml::local_part(name) == local)
            .unwrap_or(false)
    }

    /// The qualified name of the first element, if one is visible in the prefix.
    pub fn root_name(&self) -> Option<&str> {
        first_element_name(&self.sniff_text)
    }

    /// Whether an opening tag `<local` or `<prefix:local` appears in the prefix.
    pub fn has_tag(&self, local: &str) -> bool {
        has_open_tag(&self.sniff_text, local)
    }
}

/// Find the first element start tag, skipping the XML declaration,
/// processing instructions, comments and DOCTYPE.
fn first_element_name(text: &str) -> Option<&str> {
    let mut rest = text;
    loop {
        let start = rest.find('<')?;
        rest = &rest[start + 1..];
        if rest.starts_with('?') || rest.starts_with('!') {
            if let Some(stripped) = rest.strip_prefix("!--") {
                let end = stripped.find("-->")?;
                rest = &stripped[end + 3..];
            }
            continue;
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..end];
        return (!name.is_empty()).then_some(name);
    }
}

fn has_open_tag(text: &str, local: &str) -> bool {
    let mut rest = text;
    while let Some(pos) = rest.find('<') {
        rest = &rest[pos + 1..];
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..end];
        if !name.starts_with(['?', '!']) && crate::import::xml::local_part(name) == local {
            return true;
        }
    }
    false
}

//! Header block prefixed to every bundle.
//!
//! The block carries the serialized descriptor as line comments so the
//! scripting host (and `scriptpack import`) can read it back:
//!
//! ```text
//! // ==ScriptPack==
//! // compatibilityVersion: '2'
//! // name: miner
//! // ...
//! // ==/ScriptPack==
//! ```

use anyhow::{bail, Context, Result};

use crate::metadata::{self, ProjectMetadata, UnifiedDescriptor};

/// First line of a header block
pub const HEADER_OPEN: &str = "// ==ScriptPack==";

/// Last line of a header block
pub const HEADER_CLOSE: &str = "// ==/ScriptPack==";

/// Render the header block for a record, newline-terminated
pub fn render(meta: &ProjectMetadata) -> Result<String> {
    let yaml = metadata::serialize(meta)?;

    let mut out = String::with_capacity(yaml.len() + 64);
    out.push_str(HEADER_OPEN);
    out.push('\n');
    for line in yaml.lines() {
        if line.is_empty() {
            out.push_str("//");
        } else {
            out.push_str("// ");
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push_str(HEADER_CLOSE);
    out.push('\n');
    Ok(out)
}

/// Split a script into its header descriptor and body
///
/// Returns `Ok(None)` when the script has no header block.
pub fn split(text: &str) -> Result<Option<(UnifiedDescriptor, &str)>> {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok(None);
    };
    if first.trim_end() != HEADER_OPEN {
        return Ok(None);
    }

    let mut consumed = first.len();
    let mut yaml = String::new();
    for line in lines {
        consumed += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        if content == HEADER_CLOSE {
            let descriptor = if yaml.trim().is_empty() {
                UnifiedDescriptor::default()
            } else {
                serde_yaml::from_str(&yaml).context("Header block is not valid YAML")?
            };
            return Ok(Some((descriptor, &text[consumed..])));
        }

        match content.strip_prefix("// ") {
            Some(rest) => yaml.push_str(rest),
            None if content == "//" => {}
            None => bail!("Malformed header line: {:?}", content),
        }
        yaml.push('\n');
    }

    bail!("Header block is missing its closing line")
}

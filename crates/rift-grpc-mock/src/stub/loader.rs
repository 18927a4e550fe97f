//! Loading seed stubs from files.

use super::types::Stub;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize)]
#[serde(untagged)]
enum StubFile {
    Many(Vec<Stub>),
    One(Box<Stub>),
}

impl StubFile {
    fn into_stubs(self) -> Vec<Stub> {
        match self {
            StubFile::Many(stubs) => stubs,
            StubFile::One(stub) => vec![*stub],
        }
    }
}

/// Load stubs from a JSON or YAML file holding a single stub or a list.
///
/// The format is chosen by extension: `.yaml`/`.yml` is YAML, anything else JSON.
pub fn load_stubs_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Stub>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read stub file {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let file: StubFile = if is_yaml {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid YAML stub file {}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid JSON stub file {}", path.display()))?
    };

    let stubs = file.into_stubs();
    debug!("Loaded {} stubs from {:?}", stubs.len(), path);
    Ok(stubs)
}

use crate::util::read_inline_or_file;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

pub type LabelMap = BTreeMap<String, String>;
pub type AnnotationMap = BTreeMap<String, String>;

const MAX_NAME_LEN: usize = 63;
const MAX_PREFIX_LEN: usize = 253;

#[derive(ThisError, Debug)]
pub enum MetadataError {
    #[error("Invalid label '{input}': {reason}")]
    Label { input: String, reason: String },
    #[error("Invalid annotation '{input}': {reason}")]
    Annotation { input: String, reason: String },
    #[error("Failed to read manifest '{input}'")]
    ManifestRead {
        input: String,
        #[source]
        error: std::io::Error,
    },
    #[error("Failed to parse manifest")]
    ManifestParse(#[source] serde_yaml::Error),
}

/// The part of a Kubernetes manifest's `metadata` block the API cares about.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Metadata {
    pub name: Option<String>,
    #[serde(default)]
    pub labels: LabelMap,
    #[serde(default)]
    pub annotations: AnnotationMap,
}

#[derive(Debug, Clone, Deserialize)]
struct Manifest {
    metadata: Metadata,
}

impl Metadata {
    /// Reads `metadata` from a manifest given inline or as `@path`.
    pub async fn from_manifest(input: &str) -> Result<Self, MetadataError> {
        let content = read_inline_or_file(input)
            .await
            .map_err(|error| MetadataError::ManifestRead {
                input: input.to_string(),
                error,
            })?;

        let manifest: Manifest =
            serde_yaml::from_str(&content).map_err(MetadataError::ManifestParse)?;

        for (key, value) in manifest.metadata.labels.iter() {
            validate_label(key, value).map_err(|reason| MetadataError::Label {
                input: format!("{key}={value}"),
                reason,
            })?;
        }
        for key in manifest.metadata.annotations.keys() {
            validate_key(key).map_err(|reason| MetadataError::Annotation {
                input: key.clone(),
                reason,
            })?;
        }

        Ok(manifest.metadata)
    }

    /// Merges `--label` options on top of the current labels.
    pub fn extend_labels<'a, I>(&mut self, inputs: I) -> Result<(), MetadataError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for input in inputs {
            self.labels.extend(parse_labels(input)?);
        }
        Ok(())
    }

    /// Merges `--annotation` options on top of the current annotations.
    pub fn extend_annotations<'a, I>(&mut self, inputs: I) -> Result<(), MetadataError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for input in inputs {
            let (key, value) = parse_annotation(input)?;
            self.annotations.insert(key, value);
        }
        Ok(())
    }
}

/// Parses `key=value[,key=value...]`.
pub fn parse_labels(input: &str) -> Result<Vec<(String, String)>, MetadataError> {
    let label_error = |reason: String| MetadataError::Label {
        input: input.to_string(),
        reason,
    };

    input
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> Result<(String, String), MetadataError> {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| label_error(format!("'{pair}' is not of the form key=value")))?;
            let (key, value) = (key.trim(), value.trim());
            validate_label(key, value).map_err(label_error)?;
            Ok((key.to_string(), value.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .and_then(|labels| {
            if labels.is_empty() {
                Err(label_error("no labels given".to_string()))
            } else {
                Ok(labels)
            }
        })
}

/// Parses `key=value`. Only the first `=` separates, the value is free-form.
pub fn parse_annotation(input: &str) -> Result<(String, String), MetadataError> {
    let annotation_error = |reason: String| MetadataError::Annotation {
        input: input.to_string(),
        reason,
    };

    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| annotation_error("expected key=value".to_string()))?;
    let key = key.trim();
    validate_key(key).map_err(annotation_error)?;

    Ok((key.to_string(), value.to_string()))
}

fn validate_label(key: &str, value: &str) -> Result<(), String> {
    validate_key(key)?;
    if !value.is_empty() {
        validate_name(value).map_err(|reason| format!("value {reason}"))?;
    }
    Ok(())
}

/// Kubernetes qualified name: `[prefix/]name`.
fn validate_key(key: &str) -> Result<(), String> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        validate_prefix(prefix)?;
    }
    validate_name(name).map_err(|reason| format!("key {reason}"))
}

fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("must not be empty".to_string());
    }
    if name.len() > MAX_NAME_LEN {
        return Err(format!("must be at most {MAX_NAME_LEN} characters"));
    }

    let bytes = name.as_bytes();
    let alnum_edges =
        bytes[0].is_ascii_alphanumeric() && bytes[bytes.len() - 1].is_ascii_alphanumeric();
    let allowed = bytes
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));

    if alnum_edges && allowed {
        Ok(())
    } else {
        Err(format!(
            "'{name}' must consist of alphanumerics, '-', '_' or '.' and start and end with an alphanumeric"
        ))
    }
}

fn validate_prefix(prefix: &str) -> Result<(), String> {
    if prefix.is_empty() || prefix.len() > MAX_PREFIX_LEN {
        return Err(format!(
            "prefix '{prefix}' must be between 1 and {MAX_PREFIX_LEN} characters"
        ));
    }

    let valid = prefix.split('.').all(|part| {
        let bytes = part.as_bytes();
        !bytes.is_empty()
            && bytes.len() <= MAX_NAME_LEN
            && bytes[0].is_ascii_alphanumeric()
            && bytes[bytes.len() - 1].is_ascii_alphanumeric()
            && bytes
                .iter()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
    });

    if valid {
        Ok(())
    } else {
        Err(format!("prefix '{prefix}' must be a DNS subdomain"))
    }
}

use std::{borrow::Cow, path::Path};
use url::Url;

pub fn remove_trailing_slash(string: &str) -> String {
    if let Some(end) = string.strip_suffix('/') {
        end.to_string()
    } else {
        string.to_string()
    }
}

/// Turns a bare hostname like `platform.example.com` into `https://platform.example.com`.
/// Values that already carry an `http` or `https` scheme are kept as they are.
pub fn base_url_from_hostname(hostname: &str) -> Result<String, url::ParseError> {
    let hostname = hostname.trim();
    let candidate = match Url::parse(hostname) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => hostname.to_string(),
        _ => format!("https://{hostname}"),
    };

    let url = Url::parse(&candidate)?;
    if url.host_str().is_none() {
        return Err(url::ParseError::EmptyHost);
    }

    Ok(remove_trailing_slash(url.as_str()))
}

/// Values prefixed with `@` name a file to read, anything else is the content itself.
pub async fn read_inline_or_file(value: &str) -> std::io::Result<Cow<'_, str>> {
    match value.strip_prefix('@') {
        Some(path) => {
            let content = tokio::fs::read_to_string(Path::new(path)).await?;
            Ok(Cow::Owned(content))
        }
        None => Ok(Cow::Borrowed(value)),
    }
}

use crate::{
    auth::{AuthError, Authenticator},
    cli::CreateArgs,
    config::{ConfigError, Credentials},
    metadata::{Metadata, MetadataError},
    platform_client::{http_client, ApiError, PlatformClient},
    request::namespace::{InputError, NamespaceRequest, NamespaceResponse, ServicePrincipals},
    util::{base_url_from_hostname, read_inline_or_file},
};
use serde_json::Value;
use std::{collections::HashMap, io::Write, time::SystemTime};
use thiserror::Error as ThisError;
use tracing::{info_span, Instrument};
use url::Url;

#[derive(ThisError, Debug)]
pub enum CreateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("Name passed as '-' but no name provided in manifest metadata")]
    MissingManifestName,
    #[error("Expected that name '{name}' is prefixed with product key '{product_key}'")]
    NameNotPrefixed { name: String, product_key: String },
    #[error("Failed to read extra data '{input}'")]
    ExtraDataRead {
        input: String,
        #[source]
        error: std::io::Error,
    },
    #[error("Failed to parse extra data")]
    ExtraDataParse(#[source] serde_yaml::Error),
    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Failed to serialize payload")]
    Payload(#[source] serde_json::Error),
    #[error("Failed to write output")]
    Output(#[source] std::io::Error),
}

/// Where to send the two requests of a `create` run.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub authority: String,
    pub platform_api: String,
}

impl Endpoints {
    pub fn from_args(args: &CreateArgs) -> Result<Self, ConfigError> {
        let platform_api =
            base_url_from_hostname(&args.hostname).map_err(|error| ConfigError::Hostname {
                hostname: args.hostname.clone(),
                error,
            })?;

        let authority_error = |error| ConfigError::Authority {
            authority: args.authority.clone(),
            error,
        };
        let authority = Url::parse(&args.authority).map_err(authority_error)?;
        if !matches!(authority.scheme(), "http" | "https") {
            return Err(authority_error(url::ParseError::RelativeUrlWithoutBase));
        }

        Ok(Endpoints {
            authority: authority.to_string(),
            platform_api,
        })
    }
}

/// Resolves the namespace suffix, honouring `-` and `--strip-prefix`.
pub fn resolve_suffix(
    product_key: &str,
    suffix: &str,
    strip_prefix: bool,
    manifest_name: Option<&str>,
) -> Result<String, CreateError> {
    let strict = suffix == "-";
    let name = if strict {
        manifest_name.ok_or(CreateError::MissingManifestName)?
    } else {
        suffix
    };

    if !(strip_prefix || strict) {
        return Ok(name.to_string());
    }

    match name.strip_prefix(&format!("{product_key}-")) {
        Some(stripped) => Ok(stripped.to_string()),
        None if strict => Err(CreateError::NameNotPrefixed {
            name: name.to_string(),
            product_key: product_key.to_string(),
        }),
        None => Ok(name.to_string()),
    }
}

fn service_principals_from_args(args: &CreateArgs) -> ServicePrincipals {
    let mut principals = match &args.service_principals_raw {
        Some(raw) => {
            let mut principals = ServicePrincipals::new_no_default();
            principals.extend(raw.split(',').map(str::to_string));
            principals
        }
        None => ServicePrincipals::new(),
    };
    principals.extend(args.service_principals.iter().cloned());
    principals
}

async fn extra_properties_from_args(
    args: &CreateArgs,
) -> Result<HashMap<String, Value>, CreateError> {
    let Some(input) = &args.extra_data else {
        return Ok(HashMap::new());
    };

    let content = read_inline_or_file(input)
        .await
        .map_err(|error| CreateError::ExtraDataRead {
            input: input.clone(),
            error,
        })?;

    serde_yaml::from_str(&content).map_err(CreateError::ExtraDataParse)
}

/// Validates all input and assembles the payload. Nothing here touches the network.
pub async fn build_request(args: &CreateArgs) -> Result<NamespaceRequest, CreateError> {
    let mut metadata = match &args.manifest {
        Some(manifest) => Metadata::from_manifest(manifest).await?,
        None => Metadata::default(),
    };
    metadata.extend_labels(args.labels.iter().map(String::as_str))?;
    metadata.extend_annotations(args.annotations.iter().map(String::as_str))?;

    let suffix = resolve_suffix(
        &args.product_key,
        &args.suffix,
        args.strip_prefix,
        metadata.name.as_deref(),
    )?;

    let request = NamespaceRequest::new(args.product_key.as_str(), suffix, args.cluster.as_str())?
        .with_ttl(args.ttl.clone())
        .with_labels(metadata.labels)
        .with_annotations(metadata.annotations)
        .with_service_principals(service_principals_from_args(args))
        .with_extra_properties(extra_properties_from_args(args).await?)?;

    Ok(request)
}

/// Fetches a token and submits the request.
pub async fn submit(
    endpoints: &Endpoints,
    credentials: &Credentials,
    request: &NamespaceRequest,
) -> Result<NamespaceResponse, CreateError> {
    let client = http_client().map_err(CreateError::HttpClient)?;

    let authenticator = Authenticator::new(client.clone(), &endpoints.authority);
    let token = authenticator
        .fetch_token(credentials)
        .instrument(info_span!("auth", tenant = %credentials.tenant))
        .await?;

    let platform_client = PlatformClient::new(client, &endpoints.platform_api);
    let response = platform_client
        .upsert_namespace(&token, request)
        .instrument(info_span!("upsert", namespace = %request.namespace_name()))
        .await?;

    Ok(response)
}

/// Runs `create`: builds the request, then either prints it (dry run) or submits it
/// and prints the API's answer to `out`.
///
/// `lookup` resolves the credential environment variables.
pub async fn create<F, W>(args: CreateArgs, lookup: F, out: &mut W) -> Result<(), CreateError>
where
    F: Fn(&str) -> Option<String>,
    W: Write,
{
    let endpoints = Endpoints::from_args(&args)?;
    let request = build_request(&args).await?;

    if args.dry_run {
        let payload = serde_json::to_string_pretty(&request).map_err(CreateError::Payload)?;
        writeln!(out, "Would submit the following payload to the API:\n{payload}")
            .map_err(CreateError::Output)?;
        eprintln!("Dry-run, not calling API!");
        return Ok(());
    }

    let credentials = Credentials::from_lookup(args.tenant.as_str(), lookup)?;

    tracing::info!(
        cluster = %request.cluster(),
        namespace = %request.namespace_name(),
        ttl = %request.ttl(),
        "Creating namespace"
    );

    let submitted_at = SystemTime::now();
    let response = submit(&endpoints, &credentials, &request).await?;

    tracing::debug!(
        expiry = %response.expiry,
        expected_expiry = ?request.ttl().expiry_from(submitted_at),
        "Namespace upserted"
    );

    writeln!(out, "{response}").map_err(CreateError::Output)?;

    Ok(())
}

use crate::{
    consts::DEFAULT_SERVICE_PRINCIPAL,
    metadata::{AnnotationMap, LabelMap},
    ttl::Ttl,
};
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::{collections::HashMap, fmt};
use thiserror::Error as ThisError;

const MAX_NAMESPACE_LEN: usize = 63;

/// Top level keys owned by [`NamespaceRequest`], extra properties may not use them.
const RESERVED_KEYS: [&str; 7] = [
    "productkey",
    "ttl",
    "cluster",
    "namespace",
    "labels",
    "annotations",
    "vault_config",
];

#[derive(ThisError, Debug, PartialEq, Eq)]
pub enum InputError {
    #[error("Product key must not be empty")]
    EmptyProductKey,
    #[error("Namespace suffix must not be empty")]
    EmptySuffix,
    #[error("Cluster must not be empty")]
    EmptyCluster,
    #[error("'{name}' is not a valid namespace name: {reason}")]
    InvalidNamespace { name: String, reason: &'static str },
    #[error("Extra property '{0}' collides with a request field")]
    ReservedExtraProperty(String),
}

/// Service accounts that get vault access inside the namespace.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct ServicePrincipals {
    include_default: bool,
    service_accounts: Vec<String>,
}

impl ServicePrincipals {
    pub fn new() -> Self {
        ServicePrincipals::default()
    }

    /// An empty set that does not implicitly contain the default account.
    pub fn new_no_default() -> Self {
        ServicePrincipals {
            include_default: false,
            service_accounts: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.service_accounts.is_empty()
    }

    pub fn to_service_account_string(&self) -> String {
        let mut accounts = Vec::with_capacity(self.service_accounts.len() + 1);
        if self.include_default {
            accounts.push(DEFAULT_SERVICE_PRINCIPAL);
        }
        accounts.extend(self.service_accounts.iter().map(String::as_str));
        accounts.join(",")
    }
}

impl Default for ServicePrincipals {
    fn default() -> Self {
        ServicePrincipals {
            include_default: true,
            service_accounts: Vec::new(),
        }
    }
}

impl Extend<String> for ServicePrincipals {
    fn extend<T>(&mut self, iter: T)
    where
        T: IntoIterator<Item = String>,
    {
        for account in iter {
            let account = account.trim();
            if account.is_empty() {
                continue;
            }
            if account == DEFAULT_SERVICE_PRINCIPAL {
                self.include_default = true;
            } else if !self.service_accounts.iter().any(|a| a == account) {
                self.service_accounts.push(account.to_string());
            }
        }
    }
}

impl Serialize for ServicePrincipals {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("vault_config", 1)?;
        s.serialize_field("service_account_name", &self.to_service_account_string())?;
        s.end()
    }
}

/// Body of `POST /namespace`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NamespaceRequest {
    #[serde(rename = "productkey")]
    product_key: String,
    ttl: Ttl,
    cluster: String,
    #[serde(rename = "namespace")]
    suffix: String,
    #[serde(skip_serializing_if = "LabelMap::is_empty")]
    labels: LabelMap,
    #[serde(skip_serializing_if = "AnnotationMap::is_empty")]
    annotations: AnnotationMap,
    #[serde(
        rename = "vault_config",
        skip_serializing_if = "ServicePrincipals::is_empty"
    )]
    service_principals: ServicePrincipals,
    #[serde(flatten)]
    extra_properties: HashMap<String, Value>,
}

impl NamespaceRequest {
    /// Validates the resulting namespace name before anything is sent.
    pub fn new(
        product_key: impl Into<String>,
        suffix: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Result<Self, InputError> {
        let product_key = product_key.into();
        let suffix = suffix.into();
        let cluster = cluster.into();

        if product_key.is_empty() {
            return Err(InputError::EmptyProductKey);
        }
        if suffix.is_empty() {
            return Err(InputError::EmptySuffix);
        }
        if cluster.trim().is_empty() {
            return Err(InputError::EmptyCluster);
        }
        validate_namespace_name(&namespace_name(&product_key, &suffix))?;

        Ok(NamespaceRequest {
            product_key,
            ttl: Ttl::default(),
            cluster,
            suffix,
            labels: LabelMap::new(),
            annotations: AnnotationMap::new(),
            service_principals: ServicePrincipals::default(),
            extra_properties: HashMap::new(),
        })
    }

    pub fn with_ttl(mut self, ttl: Ttl) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_annotations(mut self, annotations: AnnotationMap) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_service_principals(mut self, service_principals: ServicePrincipals) -> Self {
        self.service_principals = service_principals;
        self
    }

    pub fn with_extra_properties(
        mut self,
        extra_properties: HashMap<String, Value>,
    ) -> Result<Self, InputError> {
        if let Some(key) = extra_properties
            .keys()
            .find(|key| RESERVED_KEYS.contains(&key.as_str()))
        {
            return Err(InputError::ReservedExtraProperty(key.clone()));
        }
        self.extra_properties = extra_properties;
        Ok(self)
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn ttl(&self) -> &Ttl {
        &self.ttl
    }

    /// Full name of the namespace the API will create.
    pub fn namespace_name(&self) -> String {
        namespace_name(&self.product_key, &self.suffix)
    }
}

pub fn namespace_name(product_key: &str, suffix: &str) -> String {
    format!("{product_key}-{suffix}")
}

/// RFC 1123 label, which is what Kubernetes requires for namespace names.
pub fn validate_namespace_name(name: &str) -> Result<(), InputError> {
    let invalid = |reason| InputError::InvalidNamespace {
        name: name.to_string(),
        reason,
    };

    if name.len() > MAX_NAMESPACE_LEN {
        return Err(invalid("must be at most 63 characters"));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(invalid(
            "must consist of lowercase alphanumeric characters or '-'",
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("must start and end with an alphanumeric character"));
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamespaceResponse {
    pub message: String,
    pub namespace: String,
    pub expiry: String,
}

impl fmt::Display for NamespaceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "message: {}\nnamespace: {}\nexpiry: {}",
            self.message, self.namespace, self.expiry
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn namespace_name_joins_product_key_and_suffix() {
        for (product_key, suffix) in [("demo-product", "test"), ("a", "b"), ("pk1", "feature-42")] {
            let request = NamespaceRequest::new(product_key, suffix, "cluster").unwrap();
            assert_eq!(
                request.namespace_name(),
                format!("{product_key}-{suffix}")
            );
        }
    }

    #[test]
    fn rejects_invalid_namespace_names() {
        assert_eq!(
            NamespaceRequest::new("", "test", "c"),
            Err(InputError::EmptyProductKey)
        );
        assert_eq!(
            NamespaceRequest::new("demo", "", "c"),
            Err(InputError::EmptySuffix)
        );
        assert_eq!(
            NamespaceRequest::new("demo", "test", " "),
            Err(InputError::EmptyCluster)
        );

        for (product_key, suffix) in [
            ("Demo", "test"),
            ("demo", "te_st"),
            ("demo", "test-"),
            ("-demo", "test"),
            ("demo", "tést"),
        ] {
            assert!(
                matches!(
                    NamespaceRequest::new(product_key, suffix, "c"),
                    Err(InputError::InvalidNamespace { .. })
                ),
                "{product_key}-{suffix}"
            );
        }

        let long_suffix = "a".repeat(MAX_NAMESPACE_LEN - "demo-".len());
        assert!(NamespaceRequest::new("demo", &long_suffix, "c").is_ok());
        let too_long = format!("{long_suffix}a");
        assert!(NamespaceRequest::new("demo", &too_long, "c").is_err());
    }

    #[test]
    fn minimal_payload() {
        let request = NamespaceRequest::new("demo-product", "test", "eu-west")
            .unwrap()
            .with_ttl("7d".parse().unwrap());

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "productkey": "demo-product",
                "ttl": "7d",
                "cluster": "eu-west",
                "namespace": "test",
            })
        );
    }

    #[test]
    fn full_payload() {
        let mut principals = ServicePrincipals::new();
        principals.extend(["builder".to_string(), "deployer".to_string()]);

        let request = NamespaceRequest::new("demo-product", "test", "eu-west")
            .unwrap()
            .with_labels(LabelMap::from([("team".into(), "platform".into())]))
            .with_annotations(AnnotationMap::from([("note".into(), "hi".into())]))
            .with_service_principals(principals)
            .with_extra_properties(HashMap::from([("quota".into(), json!({"cpu": 2}))]))
            .unwrap();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "productkey": "demo-product",
                "ttl": "24h",
                "cluster": "eu-west",
                "namespace": "test",
                "labels": {"team": "platform"},
                "annotations": {"note": "hi"},
                "vault_config": {"service_account_name": "default,builder,deployer"},
                "quota": {"cpu": 2},
            })
        );
    }

    #[test]
    fn extra_properties_cannot_shadow_fields() {
        let result = NamespaceRequest::new("demo", "test", "c")
            .unwrap()
            .with_extra_properties(HashMap::from([("ttl".into(), json!("99d"))]));
        assert_eq!(
            result,
            Err(InputError::ReservedExtraProperty("ttl".to_string()))
        );
    }

    #[test]
    fn service_principals_without_default() {
        let mut principals = ServicePrincipals::new_no_default();
        principals.extend(["a".to_string(), " b ".to_string(), "a".to_string()]);
        assert_eq!(principals.to_service_account_string(), "a,b");

        principals.extend(["default".to_string()]);
        assert_eq!(principals.to_service_account_string(), "default,a,b");
    }

    #[test]
    fn only_default_principal_is_not_sent() {
        let request = NamespaceRequest::new("demo", "test", "c").unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("vault_config").is_none());
    }

    #[test]
    fn response_display() {
        let response = NamespaceResponse {
            message: "Namespace demo-product-test created or updated.".to_string(),
            namespace: "demo-product-test".to_string(),
            expiry: "2021-08-03T09:49:17Z".to_string(),
        };
        assert_eq!(
            response.to_string(),
            "message: Namespace demo-product-test created or updated.\nnamespace: demo-product-test\nexpiry: 2021-08-03T09:49:17Z"
        );
    }
}

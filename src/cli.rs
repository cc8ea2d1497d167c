use crate::{
    consts::{
        AUTHORITY_DEFAULT_URL, AUTHORITY_ENV_VAR, CLUSTER_ENV_VAR, DEFAULT_TTL, HOSTNAME_ENV_VAR,
        TENANT_ENV_VAR,
    },
    ttl::Ttl,
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Platform API Namespace Client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Creates a dynamic namespace, or updates it if it already exists
    Create(CreateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Product key, prepended to the namespace name
    pub product_key: String,
    /// Namespace name, appended as suffix to the product key.
    /// Use '-' to take the name from --metadata-from-manifest
    pub suffix: String,
    /// TTL for the namespace. Valid values are 1-24h or 1-7d
    #[clap(long, default_value = DEFAULT_TTL)]
    pub ttl: Ttl,
    /// Strip the product key prefix from the namespace name if it is already prepended
    #[clap(short, long)]
    pub strip_prefix: bool,
    /// Labels as key=value, comma separated pairs are allowed
    #[clap(short = 'l', long = "label", value_name = "KEY=VALUE")]
    pub labels: Vec<String>,
    /// Annotation as key=value
    #[clap(short = 'a', long = "annotation", value_name = "KEY=VALUE")]
    pub annotations: Vec<String>,
    /// Read name, labels and annotations from a manifest's metadata.
    /// A value prefixed with '@' is treated as a filename
    #[clap(long = "metadata-from-manifest", required_if_eq("suffix", "-"))]
    pub manifest: Option<String>,
    /// Add a service principal with vault access, in addition to 'default'
    #[clap(
        long = "service-principal",
        visible_alias = "vault-service-account",
        value_name = "NAME"
    )]
    pub service_principals: Vec<String>,
    /// Comma separated service principals with vault access, replacing the default list
    #[clap(
        long = "service-principals-raw",
        visible_alias = "vault-service-account-raw",
        value_name = "NAMES",
        conflicts_with = "service_principals"
    )]
    pub service_principals_raw: Option<String>,
    /// Extra properties for the API as yaml or json.
    /// A value prefixed with '@' is treated as a filename
    #[clap(long = "extra-data")]
    pub extra_data: Option<String>,
    /// Print the payload instead of calling the API
    #[clap(short, long)]
    pub dry_run: bool,
    /// Hostname of the Platform API
    #[clap(long, env = HOSTNAME_ENV_VAR)]
    pub hostname: String,
    /// Cluster to create the namespace in
    #[clap(long, env = CLUSTER_ENV_VAR)]
    pub cluster: String,
    /// Tenant used for authentication
    #[clap(long, env = TENANT_ENV_VAR)]
    pub tenant: String,
    /// OAuth authority issuing tokens for the tenant
    #[clap(long, env = AUTHORITY_ENV_VAR, default_value = AUTHORITY_DEFAULT_URL, hide = true)]
    pub authority: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    const CONNECTION: [&str; 6] = [
        "--hostname",
        "platform.example.com",
        "--cluster",
        "eu-west",
        "--tenant",
        "tenant.example",
    ];

    fn parse(args: &[&str]) -> Result<CreateArgs, clap::Error> {
        let argv = ["platform-ns", "create"]
            .into_iter()
            .chain(CONNECTION)
            .chain(args.iter().copied());
        Cli::try_parse_from(argv).map(|cli| match cli.command {
            Commands::Create(args) => args,
        })
    }

    /// Parses `create demo-product test` with `flag` left out, so its value has to come
    /// from `env_var`. Each caller owns a distinct variable.
    fn assert_env_fallback(flag: &str, env_var: &str, read: fn(&CreateArgs) -> &str) {
        let parse_without_flag = || {
            let connection = CONNECTION
                .chunks(2)
                .filter(|pair| pair[0] != flag)
                .flatten()
                .copied();
            let argv = ["platform-ns", "create"]
                .into_iter()
                .chain(connection)
                .chain(["demo-product", "test"]);
            Cli::try_parse_from(argv).map(|cli| match cli.command {
                Commands::Create(args) => args,
            })
        };

        std::env::remove_var(env_var);
        let error = parse_without_flag().unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingRequiredArgument, "{flag}");

        std::env::set_var(env_var, "from-env.example");
        let args = parse_without_flag();
        std::env::remove_var(env_var);
        assert_eq!(read(&args.unwrap()), "from-env.example");
    }

    #[test]
    fn hostname_falls_back_to_env() {
        assert_env_fallback("--hostname", HOSTNAME_ENV_VAR, |args| args.hostname.as_str());
    }

    #[test]
    fn cluster_falls_back_to_env() {
        assert_env_fallback("--cluster", CLUSTER_ENV_VAR, |args| args.cluster.as_str());
    }

    #[test]
    fn tenant_falls_back_to_env() {
        assert_env_fallback("--tenant", TENANT_ENV_VAR, |args| args.tenant.as_str());
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_create() {
        let args = parse(&[
            "--ttl",
            "7d",
            "-l",
            "team=platform",
            "--label",
            "tier=dev",
            "--service-principal",
            "builder",
            "demo-product",
            "test",
        ])
        .unwrap();

        assert_eq!(args.product_key, "demo-product");
        assert_eq!(args.suffix, "test");
        assert_eq!(args.ttl.as_str(), "7d");
        assert_eq!(args.labels, vec!["team=platform", "tier=dev"]);
        assert_eq!(args.service_principals, vec!["builder"]);
        assert_eq!(args.cluster, "eu-west");
        assert!(!args.dry_run);
    }

    #[test]
    fn ttl_defaults_to_a_day() {
        let args = parse(&["demo-product", "test"]).unwrap();
        assert_eq!(args.ttl.as_str(), "24h");
    }

    #[test]
    fn rejects_invalid_ttl() {
        assert!(parse(&["--ttl", "8d", "demo-product", "test"]).is_err());
    }

    #[test]
    fn suffix_and_product_key_are_required() {
        assert!(parse(&["demo-product"]).is_err());
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn dash_suffix_requires_manifest() {
        assert!(parse(&["demo-product", "-"]).is_err());
        assert!(parse(&["--metadata-from-manifest", "@ns.yaml", "demo-product", "-"]).is_ok());
    }

    #[test]
    fn raw_principals_conflict_with_single_ones() {
        assert!(parse(&[
            "--service-principal",
            "a",
            "--service-principals-raw",
            "b,c",
            "demo-product",
            "test",
        ])
        .is_err());
    }
}

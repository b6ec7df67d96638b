use regex::Regex;
use serde::Deserialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::error::{Result, StackError};

/// Region every CDN-attached certificate must be issued and validated in,
/// regardless of `provider.region`.
pub const CERTIFICATE_REGION: &str = "us-east-1";

const DOMAIN_RE: &str = r"^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$";
const REGION_RE: &str = r"^[a-z]{2}(-[a-z]+)+-[0-9]+$";
const CERT_ARN_RE: &str = r"^arn:aws[a-z-]*:acm:[a-z0-9-]+:[0-9]{12}:certificate/[A-Za-z0-9-]+$";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub site: SiteConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub cdn: CdnConfig,

    #[serde(default)]
    pub assets: AssetsConfig,
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| StackError::fs(path, e))?;
        toml::from_str(&text).map_err(|e| StackError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| StackError::ConfigParse {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })
    }

    /// Checks every named field; the first violation wins.
    pub fn validate(&self) -> Result<()> {
        let domain = &self.site.domain;
        if !regex(DOMAIN_RE, "site.domain")?.is_match(domain) {
            return Err(StackError::invalid(
                "site.domain",
                format!("'{domain}' is not a lowercase DNS name with at least two labels"),
            ));
        }

        for (field, doc) in [
            ("site.index_document", &self.site.index_document),
            ("site.error_document", &self.site.error_document),
        ] {
            if doc.trim().is_empty() {
                return Err(StackError::invalid(field, "must not be empty"));
            }
            if doc.starts_with('/') {
                return Err(StackError::invalid(
                    field,
                    format!("'{doc}' must be relative to the site root (no leading '/')"),
                ));
            }
        }

        if self.site.asset_dir.trim().is_empty() {
            return Err(StackError::invalid("site.asset_dir", "must not be empty"));
        }

        if let Some(zone) = self.zone() {
            if !regex(DOMAIN_RE, "site.zone")?.is_match(zone) {
                return Err(StackError::invalid(
                    "site.zone",
                    format!("'{zone}' is not a lowercase DNS name"),
                ));
            }
            if domain != zone && !domain.ends_with(&format!(".{zone}")) {
                return Err(StackError::invalid(
                    "site.zone",
                    format!("'{domain}' is not inside zone '{zone}'"),
                ));
            }
        }

        if self.site.include_www && !self.is_apex() {
            return Err(StackError::invalid(
                "site.include_www",
                format!("only valid for an apex domain, got '{domain}'"),
            ));
        }

        if let Some(arn) = self.certificate_arn() {
            if !regex(CERT_ARN_RE, "site.certificate_arn")?.is_match(arn) {
                return Err(StackError::invalid(
                    "site.certificate_arn",
                    format!("'{arn}' is not an ACM certificate ARN"),
                ));
            }
        }

        if let Some(name) = self.site.stack_name.as_deref() {
            if name.trim().is_empty() {
                return Err(StackError::invalid("site.stack_name", "must not be empty when set"));
            }
        }

        if !regex(REGION_RE, "provider.region")?.is_match(&self.provider.region) {
            return Err(StackError::invalid(
                "provider.region",
                format!("'{}' is not a region name like 'us-west-2'", self.provider.region),
            ));
        }

        let cdn = &self.cdn;
        if cdn.min_ttl > cdn.default_ttl {
            return Err(StackError::invalid(
                "cdn.min_ttl",
                format!("{} exceeds cdn.default_ttl ({})", cdn.min_ttl, cdn.default_ttl),
            ));
        }
        if cdn.default_ttl > cdn.max_ttl {
            return Err(StackError::invalid(
                "cdn.default_ttl",
                format!("{} exceeds cdn.max_ttl ({})", cdn.default_ttl, cdn.max_ttl),
            ));
        }

        for pat in &self.assets.exclude {
            glob::Pattern::new(pat).map_err(|e| {
                StackError::invalid("assets.exclude", format!("bad pattern '{pat}': {e}"))
            })?;
        }

        Ok(())
    }

    pub fn stack_name(&self) -> String {
        match self.site.stack_name.as_deref() {
            Some(name) => name.to_string(),
            None => self.site.domain.replace('.', "-"),
        }
    }

    pub fn log_prefix(&self) -> String {
        match self.cdn.log_prefix.as_deref() {
            Some(prefix) => prefix.to_string(),
            None => format!("{}/", self.site.domain),
        }
    }

    pub fn certificate_arn(&self) -> Option<&str> {
        self.site
            .certificate_arn
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Explicit hosted zone, without a trailing dot.
    pub fn zone(&self) -> Option<&str> {
        self.site
            .zone
            .as_deref()
            .map(|z| z.trim().trim_end_matches('.'))
            .filter(|z| !z.is_empty())
    }

    /// The domain is the zone apex. Without `site.zone` this means exactly
    /// two labels, which is wrong for suffixes like `co.uk`.
    pub fn is_apex(&self) -> bool {
        match self.zone() {
            Some(zone) => self.site.domain == zone,
            None => self.site.domain.split('.').count() == 2,
        }
    }

    /// Hosted zone the site's records live in: `site.zone` when set, the
    /// domain itself for an apex, otherwise the domain minus its first label.
    pub fn zone_domain(&self) -> &str {
        if let Some(zone) = self.zone() {
            return zone;
        }
        if self.is_apex() {
            return &self.site.domain;
        }
        match self.site.domain.split_once('.') {
            Some((_, parent)) => parent,
            None => &self.site.domain,
        }
    }

    /// Every hostname the distribution answers for, primary first.
    pub fn served_domains(&self) -> Vec<String> {
        let mut out = vec![self.site.domain.clone()];
        if self.site.include_www {
            out.push(format!("www.{}", self.site.domain));
        }
        out
    }
}

fn regex(pattern: &str, field: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| StackError::invalid(field, e.to_string()))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    pub domain: String,

    #[serde(default = "default_asset_dir")]
    pub asset_dir: String,

    #[serde(default = "default_index_document")]
    pub index_document: String,

    #[serde(default = "default_error_document")]
    pub error_document: String,

    #[serde(default)]
    pub include_www: bool,

    #[serde(default)]
    pub certificate_arn: Option<String>,

    #[serde(default)]
    pub stack_name: Option<String>,

    #[serde(default)]
    pub zone: Option<String>,
}

fn default_asset_dir() -> String {
    "{config_dir}/www".to_string()
}

fn default_index_document() -> String {
    "index.html".to_string()
}

fn default_error_document() -> String {
    "404.html".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_region")]
    pub region: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
        }
    }
}

fn default_region() -> String {
    "us-west-2".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CdnConfig {
    #[serde(default)]
    pub price_class: PriceClass,

    #[serde(default)]
    pub min_ttl: u64,

    #[serde(default = "ten_minutes")]
    pub default_ttl: u64,

    #[serde(default = "ten_minutes")]
    pub max_ttl: u64,

    #[serde(default)]
    pub log_prefix: Option<String>,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            price_class: PriceClass::default(),
            min_ttl: 0,
            default_ttl: ten_minutes(),
            max_ttl: ten_minutes(),
            log_prefix: None,
        }
    }
}

fn ten_minutes() -> u64 {
    60 * 10
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PriceClass {
    #[default]
    #[serde(rename = "PriceClass_100")]
    Class100,
    #[serde(rename = "PriceClass_200")]
    Class200,
    #[serde(rename = "PriceClass_All")]
    All,
}

impl PriceClass {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceClass::Class100 => "PriceClass_100",
            PriceClass::Class200 => "PriceClass_200",
            PriceClass::All => "PriceClass_All",
        }
    }
}

impl fmt::Display for PriceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetsConfig {
    /// Globs matched against storage keys (`css/*.map`, `**/.DS_Store`).
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub symlinks: SymlinkPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkPolicy {
    /// Declare links to regular files; skip links to directories.
    #[default]
    Follow,
    Skip,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(text: &str) -> Config {
        Config::from_toml_str(text).expect("config parses")
    }

    #[test]
    fn defaults_fill_everything_but_domain() {
        let c = cfg("[site]\ndomain = \"www.example.com\"\n");
        assert_eq!(c.site.asset_dir, "{config_dir}/www");
        assert_eq!(c.site.index_document, "index.html");
        assert_eq!(c.site.error_document, "404.html");
        assert_eq!(c.provider.region, "us-west-2");
        assert_eq!(c.cdn.price_class, PriceClass::Class100);
        assert_eq!(c.cdn.default_ttl, 600);
        assert_eq!(c.assets.symlinks, SymlinkPolicy::Follow);
        assert_eq!(c.stack_name(), "www-example-com");
        assert_eq!(c.log_prefix(), "www.example.com/");
        c.validate().unwrap();
    }

    #[test]
    fn missing_domain_is_a_parse_error() {
        let err = Config::from_toml_str("[cdn]\nmax_ttl = 5\n").unwrap_err();
        assert!(matches!(err, StackError::ConfigParse { .. }));
    }

    #[test]
    fn unknown_price_class_is_rejected() {
        let err = Config::from_toml_str(
            "[site]\ndomain = \"example.com\"\n[cdn]\nprice_class = \"PriceClass_1\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("PriceClass_1"));
    }

    #[test]
    fn zone_domain_drops_first_label() {
        assert_eq!(cfg("[site]\ndomain = \"www.example.com\"\n").zone_domain(), "example.com");
        assert_eq!(cfg("[site]\ndomain = \"example.com\"\n").zone_domain(), "example.com");
        assert_eq!(
            cfg("[site]\ndomain = \"docs.eu.example.com\"\n").zone_domain(),
            "eu.example.com"
        );
    }

    #[test]
    fn validate_names_the_failing_field() {
        let cases = [
            ("[site]\ndomain = \"Example\"\n", "site.domain"),
            ("[site]\ndomain = \"example.com\"\n[provider]\nregion = \"mars\"\n", "provider.region"),
            (
                "[site]\ndomain = \"example.com\"\n[cdn]\ndefault_ttl = 900\nmax_ttl = 600\n",
                "cdn.default_ttl",
            ),
            (
                "[site]\ndomain = \"example.com\"\n[cdn]\nmin_ttl = 700\n",
                "cdn.min_ttl",
            ),
            (
                "[site]\ndomain = \"www.example.com\"\ninclude_www = true\n",
                "site.include_www",
            ),
            (
                "[site]\ndomain = \"example.com\"\nerror_document = \"/404.html\"\n",
                "site.error_document",
            ),
            (
                "[site]\ndomain = \"example.com\"\ncertificate_arn = \"nope\"\n",
                "site.certificate_arn",
            ),
            (
                "[site]\ndomain = \"example.com\"\n[assets]\nexclude = [\"[\"]\n",
                "assets.exclude",
            ),
            (
                "[site]\ndomain = \"www.example.com\"\nzone = \"example.org\"\n",
                "site.zone",
            ),
            (
                "[site]\ndomain = \"www.example.com\"\nzone = \"Example.com\"\n",
                "site.zone",
            ),
        ];

        for (text, field) in cases {
            match cfg(text).validate() {
                Err(StackError::InvalidConfig { field: f, .. }) => assert_eq!(f, field, "{text}"),
                other => panic!("expected invalid {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn served_domains_include_www_for_apex() {
        let c = cfg("[site]\ndomain = \"example.com\"\ninclude_www = true\n");
        c.validate().unwrap();
        assert_eq!(c.served_domains(), vec!["example.com", "www.example.com"]);
    }

    #[test]
    fn explicit_zone_covers_multi_label_suffixes() {
        let c = cfg("[site]\ndomain = \"example.co.uk\"\nzone = \"example.co.uk.\"\ninclude_www = true\n");
        c.validate().unwrap();
        assert!(c.is_apex());
        assert_eq!(c.zone_domain(), "example.co.uk");
        assert_eq!(c.served_domains(), vec!["example.co.uk", "www.example.co.uk"]);

        let sub = cfg("[site]\ndomain = \"www.example.co.uk\"\nzone = \"example.co.uk\"\n");
        sub.validate().unwrap();
        assert!(!sub.is_apex());
        assert_eq!(sub.zone_domain(), "example.co.uk");

        let guessed = cfg("[site]\ndomain = \"example.co.uk\"\n");
        assert_eq!(guessed.zone_domain(), "co.uk");
    }

    #[test]
    fn blank_certificate_arn_means_issue_one() {
        let c = cfg("[site]\ndomain = \"example.com\"\ncertificate_arn = \"  \"\n");
        assert_eq!(c.certificate_arn(), None);
    }
}

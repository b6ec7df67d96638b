//! Static site graph: fixed hosting skeleton plus one object per asset.

use std::path::Path;
use tracing::{debug, info};

use crate::{
    assets::{collect_assets, AssetFile},
    config::{Config, CERTIFICATE_REGION},
    decl::{Declaration, Ref, ResourceType, Value},
    error::Result,
    stack::{Stack, StackBuilder},
};

pub const CONTENT_BUCKET: &str = "content-bucket";
pub const LOGS_BUCKET: &str = "logs-bucket";
pub const ZONE: &str = "zone";
pub const CERT_PROVIDER: &str = "us-east-1";
pub const CERTIFICATE: &str = "certificate";
pub const VALIDATION_RECORD: &str = "certificate-validation-record";
pub const VALIDATION: &str = "certificate-validation";
pub const DISTRIBUTION: &str = "cdn";
pub const ALIAS_RECORD: &str = "alias-record";

/// Object declarations live under this prefix so a storage key can never
/// shadow a skeleton name.
pub const OBJECT_PREFIX: &str = "object:";

const ORIGIN_ID: &str = "content-bucket-origin";
const RECORD_TTL: i64 = 600;

/// Enumerates `root` and builds the full stack for it.
pub fn build_from_dir(cfg: &Config, root: &Path) -> Result<Stack> {
    let assets = collect_assets(root, &cfg.assets)?;
    build_site_stack(cfg, &assets)
}

pub fn build_site_stack(cfg: &Config, assets: &[AssetFile]) -> Result<Stack> {
    let mut b = StackBuilder::new(cfg.stack_name());

    add_skeleton(&mut b, cfg)?;

    for asset in assets {
        b.add(object_declaration(asset))?;
    }

    let stack = b.build()?;
    info!(
        stack = %stack.name(),
        objects = assets.len(),
        declarations = stack.len(),
        "built site stack"
    );
    Ok(stack)
}

/// Logical name of the object stored under `key`.
pub fn object_name(key: &str) -> String {
    format!("{OBJECT_PREFIX}{key}")
}

/// One storage object, keyed by the asset's relative path.
pub fn object_declaration(asset: &AssetFile) -> Declaration {
    Declaration::resource(&object_name(&asset.key), ResourceType::BucketObject)
        .with_parent(CONTENT_BUCKET)
        .set("bucket", Ref::new(CONTENT_BUCKET, "id"))
        .set("key", asset.key.as_str())
        .set("acl", "public-read")
        .set_opt("content_type", asset.content_type)
        .set("source", Value::Asset(asset.path.clone()))
}

fn add_skeleton(b: &mut StackBuilder, cfg: &Config) -> Result<()> {
    let domain = cfg.site.domain.as_str();
    let served = cfg.served_domains();

    b.add(
        Declaration::resource(CONTENT_BUCKET, ResourceType::Bucket)
            .set("bucket", domain)
            .set("acl", "public-read")
            .set(
                "website",
                Value::map([
                    ("index_document", Value::str(&cfg.site.index_document)),
                    ("error_document", Value::str(&cfg.site.error_document)),
                ]),
            ),
    )?;

    b.add(
        Declaration::resource(LOGS_BUCKET, ResourceType::Bucket)
            .set("bucket", format!("{domain}-logs"))
            .set("acl", "private"),
    )?;

    b.add(
        Declaration::lookup(ZONE, ResourceType::Zone)
            .set("name", format!("{}.", cfg.zone_domain())),
    )?;

    let certificate_arn: Value = match cfg.certificate_arn() {
        Some(arn) => {
            debug!(arn, "using existing certificate");
            Value::str(arn)
        }
        None => {
            add_certificate(b, cfg, &served)?;
            Ref::new(VALIDATION, "certificate_arn").into()
        }
    };

    b.add(distribution(cfg, &served, certificate_arn))?;

    for (i, host) in served.iter().enumerate() {
        b.add(
            Declaration::resource(&suffixed(ALIAS_RECORD, i), ResourceType::Record)
                .set("name", host.as_str())
                .set("zone_id", Ref::new(ZONE, "zone_id"))
                .set("type", "A")
                .set(
                    "alias",
                    Value::map([
                        ("name", Ref::new(DISTRIBUTION, "domain_name").into()),
                        ("zone_id", Ref::new(DISTRIBUTION, "hosted_zone_id").into()),
                        ("evaluate_target_health", Value::Bool(true)),
                    ]),
                ),
        )?;
    }

    Ok(())
}

/// Certificate, its DNS validation records and the validation itself, all
/// pinned to the certificate region.
fn add_certificate(b: &mut StackBuilder, cfg: &Config, served: &[String]) -> Result<()> {
    b.add(Declaration::provider_alias(CERT_PROVIDER).set("region", CERTIFICATE_REGION))?;

    let sans = &served[1..];
    let mut cert = Declaration::resource(CERTIFICATE, ResourceType::Certificate)
        .with_provider(CERT_PROVIDER)
        .set("domain_name", cfg.site.domain.as_str())
        .set("validation_method", "DNS");
    if !sans.is_empty() {
        cert = cert.set("subject_alternative_names", Value::strs(sans.iter().cloned()));
    }
    b.add(cert)?;

    let mut fqdns = Vec::with_capacity(served.len());
    for i in 0..served.len() {
        let name = suffixed(VALIDATION_RECORD, i);
        let option = |field: &str| {
            Ref::new(CERTIFICATE, "domain_validation_options")
                .index(i)
                .field(field)
        };

        b.add(
            Declaration::resource(&name, ResourceType::Record)
                .set("name", option("resource_record_name"))
                .set("type", option("resource_record_type"))
                .set("zone_id", Ref::new(ZONE, "zone_id"))
                .set("records", Value::List(vec![option("resource_record_value").into()]))
                .set("ttl", RECORD_TTL),
        )?;

        fqdns.push(Value::Ref(Ref::new(&name, "fqdn")));
    }

    b.add(
        Declaration::resource(VALIDATION, ResourceType::CertificateValidation)
            .with_provider(CERT_PROVIDER)
            .set("certificate_arn", Ref::new(CERTIFICATE, "arn"))
            .set("validation_record_fqdns", Value::List(fqdns)),
    )?;

    Ok(())
}

fn distribution(cfg: &Config, served: &[String], certificate_arn: Value) -> Declaration {
    let cdn = &cfg.cdn;
    let methods = || Value::strs(["GET", "HEAD", "OPTIONS"]);

    Declaration::resource(DISTRIBUTION, ResourceType::Distribution)
        .set("enabled", true)
        .set("aliases", Value::strs(served.iter().cloned()))
        .set(
            "origin",
            Value::map([
                ("origin_id", Value::str(ORIGIN_ID)),
                ("domain_name", Ref::new(CONTENT_BUCKET, "website_endpoint").into()),
                (
                    "custom_origin_config",
                    Value::map([
                        ("origin_protocol_policy", Value::str("http-only")),
                        ("http_port", Value::Int(80)),
                        ("https_port", Value::Int(443)),
                        ("origin_ssl_protocols", Value::strs(["TLSv1.2"])),
                    ]),
                ),
            ]),
        )
        .set("default_root_object", cfg.site.index_document.as_str())
        .set(
            "default_cache_behavior",
            Value::map([
                ("target_origin_id", Value::str(ORIGIN_ID)),
                ("viewer_protocol_policy", Value::str("redirect-to-https")),
                ("allowed_methods", methods()),
                ("cached_methods", methods()),
                (
                    "forwarded_values",
                    Value::map([
                        ("cookies", Value::map([("forward", Value::str("none"))])),
                        ("query_string", Value::Bool(false)),
                    ]),
                ),
                ("min_ttl", ttl(cdn.min_ttl)),
                ("default_ttl", ttl(cdn.default_ttl)),
                ("max_ttl", ttl(cdn.max_ttl)),
            ]),
        )
        .set("price_class", cdn.price_class.as_str())
        .set(
            "custom_error_response",
            Value::List(vec![Value::map([
                ("error_code", Value::Int(404)),
                ("response_code", Value::Int(404)),
                (
                    "response_page_path",
                    Value::str(format!("/{}", cfg.site.error_document)),
                ),
            ])]),
        )
        .set(
            "restrictions",
            Value::map([(
                "geo_restriction",
                Value::map([("restriction_type", Value::str("none"))]),
            )]),
        )
        .set(
            "viewer_certificate",
            Value::map([
                ("acm_certificate_arn", certificate_arn),
                ("ssl_support_method", Value::str("sni-only")),
                ("minimum_protocol_version", Value::str("TLSv1.2_2021")),
            ]),
        )
        .set(
            "logging_config",
            Value::map([
                ("bucket", Ref::new(LOGS_BUCKET, "bucket_domain_name").into()),
                ("include_cookies", Value::Bool(false)),
                ("prefix", Value::str(cfg.log_prefix())),
            ]),
        )
}

fn ttl(secs: u64) -> Value {
    Value::Int(i64::try_from(secs).unwrap_or(i64::MAX))
}

/// `base` for the primary host, `base-www` for the www host.
fn suffixed(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{base}-www")
    }
}

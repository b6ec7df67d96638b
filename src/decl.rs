//! Resource declarations: named, typed records of desired cloud state.

use std::{collections::BTreeMap, fmt, path::PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Kind {
    Resource,
    /// A provider configuration other declarations can be pinned to.
    Provider,
    /// Read-only lookup of something that already exists.
    Lookup,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Resource => "resource",
            Kind::Provider => "provider",
            Kind::Lookup => "lookup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResourceType {
    AwsProvider,
    Bucket,
    BucketObject,
    Zone,
    Record,
    Certificate,
    CertificateValidation,
    Distribution,
}

impl ResourceType {
    /// Provider-neutral type token.
    pub fn token(self) -> &'static str {
        match self {
            ResourceType::AwsProvider => "pulumi:providers:aws",
            ResourceType::Bucket => "aws:s3/bucket:Bucket",
            ResourceType::BucketObject => "aws:s3/bucketObject:BucketObject",
            ResourceType::Zone => "aws:route53/getZone:getZone",
            ResourceType::Record => "aws:route53/record:Record",
            ResourceType::Certificate => "aws:acm/certificate:Certificate",
            ResourceType::CertificateValidation => {
                "aws:acm/certificateValidation:CertificateValidation"
            }
            ResourceType::Distribution => "aws:cloudfront/distribution:Distribution",
        }
    }

    pub fn terraform_type(self) -> &'static str {
        match self {
            ResourceType::AwsProvider => "aws",
            ResourceType::Bucket => "aws_s3_bucket",
            ResourceType::BucketObject => "aws_s3_object",
            ResourceType::Zone => "aws_route53_zone",
            ResourceType::Record => "aws_route53_record",
            ResourceType::Certificate => "aws_acm_certificate",
            ResourceType::CertificateValidation => "aws_acm_certificate_validation",
            ResourceType::Distribution => "aws_cloudfront_distribution",
        }
    }

    /// Attributes the engine only knows as a set (indexing needs a list view).
    pub fn is_set_attribute(self, attr: &str) -> bool {
        matches!(
            (self, attr),
            (ResourceType::Certificate, "domain_validation_options")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// Unresolved pointer at another declaration's output attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub resource: String,
    pub path: Vec<Segment>,
}

impl Ref {
    pub fn new(resource: &str, field: &str) -> Self {
        Self {
            resource: resource.to_string(),
            path: vec![Segment::Field(field.to_string())],
        }
    }

    pub fn index(mut self, i: usize) -> Self {
        self.path.push(Segment::Index(i));
        self
    }

    pub fn field(mut self, name: &str) -> Self {
        self.path.push(Segment::Field(name.to_string()));
        self
    }

    /// `domain_validation_options[0].resource_record_name`
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for seg in &self.path {
            match seg {
                Segment::Field(f) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(f);
                }
                Segment::Index(i) => {
                    out.push('[');
                    out.push_str(&i.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.path_string())
    }
}

pub type Properties = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Map(Properties),
    Ref(Ref),
    /// Local file whose content the engine uploads.
    Asset(PathBuf),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn strs<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::Str(s.into())).collect())
    }

    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Every reference nested anywhere in this value, in field order.
    pub fn references(&self) -> Vec<&Ref> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a Ref>) {
        match self {
            Value::Ref(r) => out.push(r),
            Value::List(items) => items.iter().for_each(|v| v.collect_refs(out)),
            Value::Map(m) => m.values().for_each(|v| v.collect_refs(out)),
            _ => {}
        }
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: Kind,
    pub rtype: ResourceType,
    /// Provider declaration this one is pinned to; the default provider when unset.
    pub provider: Option<String>,
    /// Grouping only; implies no runtime behavior.
    pub parent: Option<String>,
    pub properties: Properties,
}

impl Declaration {
    pub fn resource(name: &str, rtype: ResourceType) -> Self {
        Self::new(name, Kind::Resource, rtype)
    }

    pub fn lookup(name: &str, rtype: ResourceType) -> Self {
        Self::new(name, Kind::Lookup, rtype)
    }

    pub fn provider_alias(name: &str) -> Self {
        Self::new(name, Kind::Provider, ResourceType::AwsProvider)
    }

    fn new(name: &str, kind: Kind, rtype: ResourceType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            rtype,
            provider: None,
            parent: None,
            properties: Properties::new(),
        }
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn set_opt(self, key: &str, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn with_provider(mut self, provider: &str) -> Self {
        self.provider = Some(provider.to_string());
        self
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// `(field, ref)` for every reference in the properties.
    pub fn references(&self) -> Vec<(&str, &Ref)> {
        self.properties
            .iter()
            .flat_map(|(k, v)| v.references().into_iter().map(move |r| (k.as_str(), r)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_path_renders_fields_and_indices() {
        let r = Ref::new("certificate", "domain_validation_options")
            .index(0)
            .field("resource_record_name");
        assert_eq!(r.path_string(), "domain_validation_options[0].resource_record_name");
        assert_eq!(
            r.to_string(),
            "certificate.domain_validation_options[0].resource_record_name"
        );
    }

    #[test]
    fn references_are_found_in_nested_values() {
        let d = Declaration::resource("cdn", ResourceType::Distribution)
            .set("enabled", true)
            .set(
                "origin",
                Value::map([
                    ("domain_name", Value::Ref(Ref::new("content-bucket", "website_endpoint"))),
                    ("origin_id", Value::str("content")),
                ]),
            )
            .set(
                "aliases",
                Value::List(vec![Value::str("a"), Ref::new("zone", "name").into()]),
            );

        let refs: Vec<_> = d
            .references()
            .into_iter()
            .map(|(field, r)| format!("{field}->{r}"))
            .collect();
        assert_eq!(
            refs,
            vec!["aliases->zone.name", "origin->content-bucket.website_endpoint"]
        );
    }

    #[test]
    fn set_opt_skips_none() {
        let d = Declaration::resource("obj", ResourceType::BucketObject)
            .set_opt("content_type", None::<&str>)
            .set_opt("key", Some("index.html"));
        assert!(!d.properties.contains_key("content_type"));
        assert_eq!(d.properties["key"], Value::str("index.html"));
    }
}

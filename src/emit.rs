use clap::ValueEnum;
use serde_json::{json, Map, Value as Json};
use std::collections::BTreeMap;

use crate::{
    decl::{Declaration, Kind, Ref, Segment, Value},
    error::{Result, StackError},
    stack::Stack,
    templates,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Engine-neutral JSON declaration list.
    #[default]
    Manifest,
    /// Terraform JSON configuration syntax.
    Terraform,
    /// Human-readable listing.
    Summary,
}

/// Serializes a resolved [`Stack`] for handoff.
#[derive(Debug, Clone)]
pub struct Emitter {
    format: Format,
    region: String,
}

impl Emitter {
    /// `region` is the default provider region, used where the format needs it.
    pub fn new(format: Format, region: &str) -> Self {
        Self {
            format,
            region: region.to_string(),
        }
    }

    pub fn emit(&self, stack: &Stack) -> Result<String> {
        let mut out = match self.format {
            Format::Manifest => serde_json::to_string_pretty(&self.manifest(stack))?,
            Format::Terraform => serde_json::to_string_pretty(&self.terraform(stack)?)?,
            Format::Summary => templates::render_summary(stack, &self.region)?,
        };
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    // -------------------- manifest --------------------

    pub fn manifest(&self, stack: &Stack) -> Json {
        let declarations: Vec<Json> = stack
            .declarations()
            .iter()
            .map(|d| {
                let depends_on: Vec<&String> = stack
                    .dependencies_of(&d.name)
                    .map(|s| s.iter().collect())
                    .unwrap_or_default();

                let mut obj = Map::new();
                obj.insert("name".into(), json!(d.name));
                obj.insert("kind".into(), json!(d.kind.as_str()));
                obj.insert("type".into(), json!(d.rtype.token()));
                if let Some(p) = &d.provider {
                    obj.insert("provider".into(), json!(p));
                }
                if let Some(p) = &d.parent {
                    obj.insert("parent".into(), json!(p));
                }
                obj.insert("depends_on".into(), json!(depends_on));
                obj.insert("properties".into(), manifest_props(&d.properties));
                Json::Object(obj)
            })
            .collect();

        json!({
            "stack": stack.name(),
            "region": self.region,
            "declarations": declarations,
        })
    }

    // -------------------- terraform --------------------

    pub fn terraform(&self, stack: &Stack) -> Result<Json> {
        let names = TerraformNames::assign(stack)?;

        let mut providers = vec![json!({ "region": self.region })];
        let mut data: BTreeMap<&str, Map<String, Json>> = BTreeMap::new();
        let mut resources: BTreeMap<&str, Map<String, Json>> = BTreeMap::new();

        for d in stack.declarations() {
            let ident = names.ident(&d.name).to_string();
            let mut body = Map::new();
            for (k, v) in &d.properties {
                body.insert(k.clone(), terraform_value(v, stack, &names));
            }

            match d.kind {
                Kind::Provider => {
                    body.insert("alias".into(), json!(ident));
                    providers.push(Json::Object(body));
                }
                Kind::Lookup => {
                    data.entry(d.rtype.terraform_type())
                        .or_default()
                        .insert(ident, Json::Object(body));
                }
                Kind::Resource => {
                    if let Some(p) = &d.provider {
                        body.insert(
                            "provider".into(),
                            json!(format!("aws.{}", names.ident(p))),
                        );
                    }
                    resources
                        .entry(d.rtype.terraform_type())
                        .or_default()
                        .insert(ident, Json::Object(body));
                }
            }
        }

        let mut root = Map::new();
        root.insert("provider".into(), json!({ "aws": providers }));
        if !data.is_empty() {
            root.insert("data".into(), json!(data));
        }
        root.insert("resource".into(), json!(resources));
        Ok(Json::Object(root))
    }
}

fn manifest_props(props: &BTreeMap<String, Value>) -> Json {
    Json::Object(
        props
            .iter()
            .map(|(k, v)| (k.clone(), manifest_value(v)))
            .collect(),
    )
}

fn manifest_value(v: &Value) -> Json {
    match v {
        Value::Bool(b) => json!(b),
        Value::Int(n) => json!(n),
        Value::Str(s) => json!(s),
        Value::List(items) => Json::Array(items.iter().map(manifest_value).collect()),
        Value::Map(m) => manifest_props(m),
        Value::Ref(r) => json!({ "ref": r.resource, "path": r.path_string() }),
        Value::Asset(p) => json!({ "asset": p.to_string_lossy() }),
    }
}

fn terraform_value(v: &Value, stack: &Stack, names: &TerraformNames) -> Json {
    match v {
        Value::Bool(b) => json!(b),
        Value::Int(n) => json!(n),
        Value::Str(s) => json!(s),
        Value::List(items) => Json::Array(
            items
                .iter()
                .map(|i| terraform_value(i, stack, names))
                .collect(),
        ),
        Value::Map(m) => Json::Object(
            m.iter()
                .map(|(k, v)| (k.clone(), terraform_value(v, stack, names)))
                .collect(),
        ),
        Value::Ref(r) => json!(format!("${{{}}}", terraform_expr(r, stack, names))),
        Value::Asset(p) => json!(p.to_string_lossy()),
    }
}

/// `aws_acm_certificate.certificate.arn`, with set attributes indexed
/// through `tolist(...)`.
fn terraform_expr(r: &Ref, stack: &Stack, names: &TerraformNames) -> String {
    let Some(target) = stack.get(&r.resource) else {
        // stacks are validated on build; keep the raw reference visible
        return r.to_string();
    };

    let mut expr = terraform_address(target, names);
    let mut segs = r.path.iter().peekable();

    while let Some(seg) = segs.next() {
        match seg {
            Segment::Field(f) => {
                let indexed = matches!(segs.peek(), Some(Segment::Index(_)));
                if indexed && target.rtype.is_set_attribute(f) {
                    expr = format!("tolist({expr}.{f})");
                } else {
                    expr.push('.');
                    expr.push_str(f);
                }
            }
            Segment::Index(i) => {
                expr.push('[');
                expr.push_str(&i.to_string());
                expr.push(']');
            }
        }
    }

    expr
}

fn terraform_address(d: &Declaration, names: &TerraformNames) -> String {
    let ident = names.ident(&d.name);
    match d.kind {
        Kind::Lookup => format!("data.{}.{}", d.rtype.terraform_type(), ident),
        Kind::Resource | Kind::Provider => format!("{}.{}", d.rtype.terraform_type(), ident),
    }
}

/// Logical names mapped onto Terraform identifiers.
///
/// Names whose sanitized forms clash within one block all get a short hash
/// of the logical name appended, so distinct names keep distinct addresses.
struct TerraformNames {
    idents: BTreeMap<String, String>,
}

impl TerraformNames {
    fn assign(stack: &Stack) -> Result<Self> {
        let mut groups: BTreeMap<(Kind, &str, String), Vec<&str>> = BTreeMap::new();
        for d in stack.declarations() {
            let slot = (d.kind, d.rtype.terraform_type(), terraform_ident(&d.name));
            groups.entry(slot).or_default().push(&d.name);
        }

        let mut idents = BTreeMap::new();
        let mut taken: BTreeMap<(Kind, &str, String), &str> = BTreeMap::new();

        for ((kind, tf_type, base), names) in &groups {
            for &name in names {
                let ident = if names.len() == 1 {
                    base.clone()
                } else {
                    format!("{base}_{}", short_hash(name))
                };
                if let Some(first) = taken.insert((*kind, *tf_type, ident.clone()), name) {
                    return Err(StackError::NameCollision {
                        first: first.to_string(),
                        second: name.to_string(),
                        ident,
                    });
                }
                idents.insert(name.to_string(), ident);
            }
        }

        Ok(Self { idents })
    }

    fn ident<'a>(&'a self, name: &'a str) -> &'a str {
        self.idents.get(name).map(String::as_str).unwrap_or(name)
    }
}

fn short_hash(name: &str) -> String {
    blake3::hash(name.as_bytes()).to_hex()[..8].to_string()
}

/// `css/site.css` -> `css_site_css`, `404.html` -> `_404_html`.
pub fn terraform_ident(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::AssetFile,
        config::Config,
        site::{build_site_stack, CERTIFICATE},
    };
    use std::path::PathBuf;

    fn stack(assets: &[(&str, Option<&'static str>)]) -> Stack {
        let cfg = Config::from_toml_str("[site]\ndomain = \"www.example.com\"\n").unwrap();
        let assets: Vec<_> = assets
            .iter()
            .map(|(k, ct)| AssetFile {
                path: PathBuf::from("/srv/www").join(k),
                key: k.to_string(),
                content_type: *ct,
            })
            .collect();
        build_site_stack(&cfg, &assets).unwrap()
    }

    #[test]
    fn idents_are_terraform_safe() {
        assert_eq!(terraform_ident("content-bucket"), "content_bucket");
        assert_eq!(terraform_ident("css/site.css"), "css_site_css");
        assert_eq!(terraform_ident("404.html"), "_404_html");
    }

    #[test]
    fn manifest_lists_declarations_in_dependency_order() {
        let s = stack(&[("index.html", Some("text/html"))]);
        let m = Emitter::new(Format::Manifest, "us-west-2").manifest(&s);

        let decls = m["declarations"].as_array().unwrap();
        assert_eq!(decls.len(), 10);
        assert_eq!(decls[0]["name"], "content-bucket");

        let obj = decls.iter().find(|d| d["name"] == "object:index.html").unwrap();
        assert_eq!(obj["parent"], "content-bucket");
        assert_eq!(obj["type"], "aws:s3/bucketObject:BucketObject");
        assert_eq!(obj["properties"]["content_type"], "text/html");
        assert_eq!(
            obj["properties"]["bucket"],
            json!({ "ref": "content-bucket", "path": "id" })
        );
        assert_eq!(obj["properties"]["source"]["asset"], "/srv/www/index.html");
    }

    #[test]
    fn terraform_renders_interpolations_and_aliases() {
        let s = stack(&[("css/site.css", Some("text/css"))]);
        let tf = Emitter::new(Format::Terraform, "eu-west-1").terraform(&s).unwrap();

        assert_eq!(
            tf["provider"]["aws"],
            json!([
                { "region": "eu-west-1" },
                { "alias": "us_east_1", "region": "us-east-1" },
            ])
        );
        assert_eq!(tf["data"]["aws_route53_zone"]["zone"]["name"], "example.com.");

        let record = &tf["resource"]["aws_route53_record"]["certificate_validation_record"];
        assert_eq!(
            record["name"],
            "${tolist(aws_acm_certificate.certificate.domain_validation_options)[0].resource_record_name}"
        );
        assert_eq!(record["zone_id"], "${data.aws_route53_zone.zone.zone_id}");

        assert_eq!(
            tf["resource"]["aws_acm_certificate"][CERTIFICATE]["provider"],
            "aws.us_east_1"
        );

        let obj = &tf["resource"]["aws_s3_object"]["object_css_site_css"];
        assert_eq!(obj["bucket"], "${aws_s3_bucket.content_bucket.id}");
        assert_eq!(obj["source"], "/srv/www/css/site.css");
    }

    #[test]
    fn clashing_idents_get_distinct_suffixes() {
        let s = stack(&[
            ("about-us.html", Some("text/html")),
            ("about_us.html", Some("text/html")),
            ("a.b.js", None),
            ("a-b.js", None),
            ("contact.html", Some("text/html")),
        ]);
        let out = Emitter::new(Format::Terraform, "us-west-2").emit(&s).unwrap();
        let tf: Json = serde_json::from_str(&out).unwrap();
        let objects = tf["resource"]["aws_s3_object"].as_object().unwrap();

        assert_eq!(objects.len(), 5);
        assert!(objects.contains_key("object_contact_html"));

        let about: Vec<_> = objects
            .iter()
            .filter(|(k, _)| k.starts_with("object_about_us_html_"))
            .map(|(_, v)| v["key"].as_str().unwrap())
            .collect();
        assert_eq!(about.len(), 2);
        assert!(about.contains(&"about-us.html"));
        assert!(about.contains(&"about_us.html"));

        let ab = objects
            .keys()
            .filter(|k| k.starts_with("object_a_b_js_"))
            .count();
        assert_eq!(ab, 2);
    }

    #[test]
    fn suffixes_are_stable_across_runs() {
        let keys = [("about-us.html", None), ("about_us.html", None)];
        let first = Emitter::new(Format::Terraform, "us-west-2").emit(&stack(&keys)).unwrap();
        let second = Emitter::new(Format::Terraform, "us-west-2").emit(&stack(&keys)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn emitted_text_ends_with_newline() {
        let s = stack(&[]);
        for f in [Format::Manifest, Format::Terraform, Format::Summary] {
            let out = Emitter::new(f, "us-west-2").emit(&s).unwrap();
            assert!(out.ends_with('\n'), "{f:?}");
        }
    }
}

use anyhow::{bail, Context as _, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::config::Config;

const DEFAULT_DOMAIN: &str = "www.example.com";

pub fn config_stub(domain: &str) -> String {
    format!(
        r#"# sitestack config (created by `sitestack init`)
#
# `sitestack build` turns the files under site.asset_dir into storage objects
# and emits them together with the bucket, CDN, DNS and certificate
# declarations for your provisioning engine.

[site]
domain         = "{domain}"
asset_dir      = "{{config_dir}}/www"
index_document = "index.html"
error_document = "404.html"
# include_www     = true                     # apex domains only
# certificate_arn = "arn:aws:acm:us-east-1:123456789012:certificate/..."
# zone            = "example.co.uk"          # hosted zone; needed when the public
#                                            # suffix has more than one label

[provider]
region = "us-west-2"

[cdn]
price_class = "PriceClass_100"
default_ttl = 600
max_ttl     = 600

[assets]
exclude  = []
symlinks = "follow"
"#
    )
}

/// Writes a starter config to `path`; refuses to clobber unless `force`.
pub fn write_config_stub(path: &Path, domain: Option<&str>, force: bool) -> Result<PathBuf> {
    let domain = domain.unwrap_or(DEFAULT_DOMAIN);
    let text = config_stub(domain);

    Config::from_toml_str(&text)
        .and_then(|cfg| cfg.validate())
        .with_context(|| format!("cannot create a config for domain '{domain}'"))?;

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_is_a_valid_config() {
        let cfg = Config::from_toml_str(&config_stub("docs.example.org")).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.site.domain, "docs.example.org");
        assert_eq!(cfg.site.asset_dir, "{config_dir}/www");
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sitestack.toml");

        write_config_stub(&path, None, false).unwrap();
        assert!(write_config_stub(&path, None, false).is_err());
        write_config_stub(&path, Some("example.com"), true).unwrap();

        let cfg = Config::load_from_path(&path).unwrap();
        assert_eq!(cfg.site.domain, "example.com");
    }

    #[test]
    fn rejects_bad_domain() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_config_stub(&tmp.path().join("s.toml"), Some("Not A Domain"), false)
            .unwrap_err();
        assert!(format!("{err:#}").contains("site.domain"));
        assert!(!tmp.path().join("s.toml").exists());
    }
}

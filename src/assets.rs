//! Asset enumeration: one [`AssetFile`] per regular file under the asset root.

pub mod mime;
pub mod walk;

use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::{
    config::AssetsConfig,
    error::{Result, StackError},
};

pub use walk::walk_files;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Absolute path on local disk; content is read by the engine, not here.
    pub path: PathBuf,
    /// Storage object name: relative to the root, `/`-separated.
    pub key: String,
    pub content_type: Option<&'static str>,
}

/// `path` relative to `root` with `/` separators and no leading separator.
pub fn storage_key(root: &Path, path: &Path) -> Result<String> {
    let outside = || StackError::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    };

    let rel = path.strip_prefix(root).map_err(|_| outside())?;

    let mut segments = Vec::new();
    for c in rel.components() {
        match c {
            Component::Normal(s) => segments.push(s.to_str().ok_or_else(|| {
                StackError::NonUtf8Path {
                    path: path.to_path_buf(),
                }
            })?),
            _ => return Err(outside()),
        }
    }

    if segments.is_empty() {
        return Err(outside());
    }

    Ok(segments.join("/"))
}

/// Walks `root` and maps every regular file to an [`AssetFile`].
pub fn collect_assets(root: &Path, cfg: &AssetsConfig) -> Result<Vec<AssetFile>> {
    let excludes = cfg
        .exclude
        .iter()
        .map(|p| {
            glob::Pattern::new(p).map_err(|e| {
                StackError::invalid("assets.exclude", format!("bad pattern '{p}': {e}"))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let opts = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let mut out = Vec::new();
    walk_files(root, cfg.symlinks, &mut |path: &Path| {
        let key = storage_key(root, path)?;

        if let Some(pat) = excludes.iter().find(|p| p.matches_with(&key, opts)) {
            debug!(key = %key, pattern = %pat, "excluded asset");
            return Ok(());
        }

        let content_type = mime::content_type(path);
        debug!(key = %key, content_type = content_type.unwrap_or("<unset>"), "asset");

        out.push(AssetFile {
            path: path.to_path_buf(),
            key,
            content_type,
        });
        Ok(())
    })?;

    info!(root = %root.display(), files = out.len(), "enumerated site assets");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn keys_use_forward_slashes_without_leading_separator() {
        let root = Path::new("/srv/site");
        assert_eq!(
            storage_key(root, &root.join("img").join("logo.png")).unwrap(),
            "img/logo.png"
        );
        assert_eq!(storage_key(root, &root.join("index.html")).unwrap(), "index.html");
    }

    #[test]
    fn keys_outside_root_are_rejected() {
        let root = Path::new("/srv/site");
        assert!(matches!(
            storage_key(root, Path::new("/srv/other/a.html")),
            Err(StackError::OutsideRoot { .. })
        ));
        assert!(storage_key(root, root).is_err());
    }

    #[test]
    fn collect_maps_every_file() {
        let tmp = tempfile::tempdir().unwrap();
        for f in ["index.html", "404.html", "css/site.css", "blob.xyz"] {
            let p = tmp.path().join(f);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(&p, "x").unwrap();
        }

        let assets = collect_assets(tmp.path(), &AssetsConfig::default()).unwrap();
        let got: Vec<_> = assets
            .iter()
            .map(|a| (a.key.as_str(), a.content_type))
            .collect();

        assert_eq!(
            got,
            vec![
                ("404.html", Some("text/html")),
                ("blob.xyz", None),
                ("css/site.css", Some("text/css")),
                ("index.html", Some("text/html")),
            ]
        );
        assert!(assets.iter().all(|a| a.path.starts_with(tmp.path())));
    }

    #[test]
    fn exclude_globs_match_keys() {
        let tmp = tempfile::tempdir().unwrap();
        for f in ["index.html", ".DS_Store", "js/app.js", "js/app.js.map"] {
            let p = tmp.path().join(f);
            fs::create_dir_all(p.parent().unwrap()).unwrap();
            fs::write(&p, "x").unwrap();
        }

        let cfg = AssetsConfig {
            exclude: vec!["**/.DS_Store".to_string(), "**/*.map".to_string()],
            ..AssetsConfig::default()
        };
        let keys: Vec<_> = collect_assets(tmp.path(), &cfg)
            .unwrap()
            .into_iter()
            .map(|a| a.key)
            .collect();

        assert_eq!(keys, vec!["index.html", "js/app.js"]);
    }
}

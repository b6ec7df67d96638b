use anyhow::{bail, Context as _, Result};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when `--config` is absent.
pub const LOCAL_CONFIG_NAME: &str = "sitestack.toml";

#[derive(Debug, Clone)]
pub struct ContextEnv {
    home: PathBuf,
    cwd: PathBuf,
    user_config_dir: Option<PathBuf>,

    config_path: Option<PathBuf>,
    config_dir: Option<PathBuf>,
}

impl ContextEnv {
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("could not determine working directory")?;
        let home = dirs::home_dir().context("could not determine home directory")?;

        Ok(Self::with_dirs(home, cwd, dirs::config_dir()))
    }

    /// Context with explicit directories instead of the process ones.
    pub fn with_dirs(home: PathBuf, cwd: PathBuf, user_config_dir: Option<PathBuf>) -> Self {
        Self {
            home,
            cwd,
            user_config_dir,
            config_path: None,
            config_dir: None,
        }
    }

    // ---------- public getters ----------

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    pub fn local_config_path(&self) -> PathBuf {
        self.cwd.join(LOCAL_CONFIG_NAME)
    }

    pub fn user_config_path(&self) -> Option<PathBuf> {
        self.user_config_dir
            .as_ref()
            .map(|d| d.join("sitestack").join("config.toml"))
    }

    // ---------- locating the config ----------

    /// Config path precedence:
    /// 1) CLI --config (must exist)
    /// 2) ./sitestack.toml
    /// 3) <user config dir>/sitestack/config.toml
    pub fn locate_config(&mut self, cli_config: Option<&Path>) -> Result<PathBuf> {
        if let Some(p) = cli_config {
            let p = self.absolutize(p);
            if !p.is_file() {
                bail!("--config was provided but file does not exist: {}", p.display());
            }
            self.set_config_path(p.clone());
            return Ok(p);
        }

        let mut tried = vec![self.local_config_path()];
        if let Some(user) = self.user_config_path() {
            tried.push(user);
        }

        if let Some(found) = tried.iter().find(|p| p.is_file()).cloned() {
            self.set_config_path(found.clone());
            return Ok(found);
        }

        let listed = tried
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        bail!("no config found (tried {listed}); run `sitestack init` to create one")
    }

    pub fn absolutize(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.cwd.join(p)
        }
    }

    fn set_config_path(&mut self, path: PathBuf) {
        self.config_dir = path.parent().map(Path::to_path_buf);
        self.config_path = Some(path);
    }
}

use std::path::PathBuf;

use crate::{
    context::ContextEnv,
    error::{Result, StackError},
};

/// Expands `{token}` placeholders in path-like config values.
pub struct Resolver<'a> {
    pub ctx: &'a ContextEnv,
    pub domain: Option<&'a str>,
}

impl<'a> Resolver<'a> {
    pub fn new(ctx: &'a ContextEnv) -> Self {
        Self { ctx, domain: None }
    }

    pub fn with_domain(mut self, domain: &'a str) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn resolve(&self, input: &str) -> Result<String> {
        // Fast path
        if !input.contains('{') {
            return Ok(input.to_string());
        }

        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                return Err(StackError::Token {
                    message: format!("unclosed token in string: {input}"),
                });
            };

            let token = &after[..close];
            let repl = self.token_value(token).ok_or_else(|| StackError::Token {
                message: format!("unknown token: {{{token}}} in: {input}"),
            })?;

            out.push_str(&repl);
            rest = &after[close + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }

    /// Resolves `input` and anchors a relative result at the config dir
    /// (or the working directory when no config has been located).
    pub fn resolve_path(&self, input: &str) -> Result<PathBuf> {
        let p = PathBuf::from(self.resolve(input)?);
        if p.is_absolute() {
            return Ok(p);
        }
        let base = self.ctx.config_dir().unwrap_or_else(|| self.ctx.cwd());
        Ok(base.join(p))
    }

    fn token_value(&self, token: &str) -> Option<String> {
        match token {
            "home" => Some(self.ctx.home().to_string_lossy().to_string()),
            "cwd" => Some(self.ctx.cwd().to_string_lossy().to_string()),
            "config_dir" => self
                .ctx
                .config_dir()
                .map(|p| p.to_string_lossy().to_string()),
            "config_path" => self
                .ctx
                .config_path()
                .map(|p| p.to_string_lossy().to_string()),
            "domain" => self.domain.map(str::to_string),
            _ => None,
        }
    }
}

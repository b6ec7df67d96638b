pub mod assets;
pub mod cli;
pub mod config;
pub mod context;
pub mod decl;
pub mod deps;
pub mod emit;
pub mod error;
pub mod init;
pub mod resolve;
pub mod site;
pub mod stack;
pub mod templates;

// Convenience re-exports
pub use assets::{collect_assets, storage_key, walk_files, AssetFile};
pub use config::{Config, CERTIFICATE_REGION};
pub use context::ContextEnv;
pub use decl::{Declaration, Kind, Ref, ResourceType, Value};
pub use emit::{Emitter, Format};
pub use error::{Result, StackError};
pub use resolve::Resolver;
pub use site::{build_from_dir, build_site_stack};
pub use stack::{Stack, StackBuilder};

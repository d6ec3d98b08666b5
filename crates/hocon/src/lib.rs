//! HOCON configuration files: parse, merge, resolve and read them.
//!
//! HOCON is a superset of JSON meant for humans: comments, unquoted
//! strings, optional commas and braces, dotted keys, includes, and `${}`
//! substitutions that refer to other settings or environment variables.
//!
//! ```
//! use hocon::Config;
//!
//! let config = Config::parse_string(
//!     r#"
//!     server {
//!         host = localhost
//!         port = 8080
//!         timeout = 30s
//!     }
//!     url = "http://"${server.host}":"${server.port}
//!     "#,
//! )
//! .unwrap()
//! .resolve()
//! .unwrap();
//!
//! assert_eq!(config.get_i32("server.port").unwrap(), 8080);
//! assert_eq!(config.get_string("url").unwrap(), "http://localhost:8080");
//! assert_eq!(config.get_duration("server.timeout").unwrap().as_secs(), 30);
//! ```
//!
//! Layered configs are built with [`Config::with_fallback`]: settings in
//! the receiver win, objects are merged key by key, and substitutions see
//! the merged result once [`Config::resolve`] runs.
//!
//! ```
//! use hocon::Config;
//!
//! let defaults = Config::parse_string("db { host = localhost, pool = 4 }").unwrap();
//! let overrides = Config::parse_string("db.pool = 16").unwrap();
//! let config = overrides.with_fallback(&defaults).resolve().unwrap();
//!
//! assert_eq!(config.get_string("db.host").unwrap(), "localhost");
//! assert_eq!(config.get_i32("db.pool").unwrap(), 16);
//! ```

mod config;
mod units;
mod validate;

pub use config::Config;
pub use units::{UnitError, parse_bytes, parse_duration};

pub use hocon_parse::{
    FallbackIncluder, FileIncluder, IncludeContext, Includer, ParseOptions, Parseable, Syntax,
    parse_path,
};
pub use hocon_tree::{
    ConfigError, ConfigList, ConfigObject, Number, Origin, Path, RenderOptions, ResolveOptions,
    Result, ValidationProblem, Value, ValueKind, ValueType, env_variables,
};

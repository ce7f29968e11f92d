//! Site assembler for vitrine.
//!
//! Copies a static site source tree into a deployable output directory and
//! delivers the runtime configuration (API URL and key) taken from the
//! environment, either inlined into HTML pages or as a `config.js` file.

pub mod assets;
pub mod builder;
pub mod exclude;
pub mod inject;
pub mod runtime;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, ConfigSource, Delivery, SiteAssembler};
pub use exclude::ExclusionSet;
pub use runtime::{EnvVars, RuntimeConfig};

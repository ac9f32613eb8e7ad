//! Configuration utility types.
//!
//! | Module   | Purpose                                      |
//! |----------|----------------------------------------------|
//! | `error`  | Config errors, directory diagnostics         |

mod error;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, DirProblem, DirSetting};

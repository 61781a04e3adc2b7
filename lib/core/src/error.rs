//! Shared result alias.
//!
//! Errors are plain enums owned by the crate that raises them. They travel
//! inside a `rootcause::Report`, so callers can attach context without
//! losing the original variant.

use rootcause::Report;

/// `Result` carrying a `Report` whose current context is `C`.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;

/// Router Module Index
///
/// Splits the HTTP surface by what the caller must present.

/// Routes that need no credentials at all.
pub mod public;

/// Routes that read the session but never reject for lack of one.
/// The guard turns a missing session into a redirect decision.
pub mod session;

/// Routes that require a resolved user (401 otherwise).
pub mod authenticated;

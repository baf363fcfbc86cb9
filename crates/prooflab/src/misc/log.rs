//! Items related to [logging](log).
//!
//! No logger is installed by the library; the `prooflab` binary sets up
//! `env_logger`.

/// Targets to be used within a [log]! macro.
pub mod targets {
    /// Formula and clause-set parsing
    pub const PARSER: &str = "parser";

    /// Clause normal form conversion
    pub const CNF: &str = "cnf";

    /// Unification steps
    pub const UNIFICATION: &str = "unification";

    /// Move application and closure checks
    pub const CALCULUS: &str = "calculus";

    /// Seal computation and verification
    pub const SEAL: &str = "seal";
}

//! Options which customize decoding.

use std::env;

/// Environment variable that selects the default [`SkipPolicy`].
pub const SKIP_POLICY_VAR: &str = "PROTOWIRE_SKIP_POLICY";

/// Environment variable that enables tracing of decoded fields to stderr.
pub const TRACE_VAR: &str = "PROTOWIRE_TRACE";

/// Specifies what [`Decoder::skip`](crate::Decoder::skip) does with the
/// deprecated group wire types.
///
/// Group values have no length prefix, so skipping them requires walking
/// nested fields up to the matching end marker. This decoder does not do
/// that.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SkipPolicy {
    /// Fail with [`ErrorKind::UnsupportedWireType`](crate::ErrorKind::UnsupportedWireType).
    #[default]
    Strict,

    /// Skip nothing and continue with the next tag. The fields inside a group
    /// are then read as if they belonged to the enclosing message.
    Permissive,
}

impl SkipPolicy {
    fn parse(val: &str) -> Option<SkipPolicy> {
        match val.trim() {
            "strict" => Some(SkipPolicy::Strict),
            "permissive" => Some(SkipPolicy::Permissive),
            _ => None,
        }
    }
}

/// Options for a [`Decoder`](crate::Decoder).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// How to handle group wire types when skipping values.
    pub skip_policy: SkipPolicy,

    /// Print each decoded tag and skipped value to stderr.
    pub trace: bool,
}

impl DecodeOptions {
    /// Return the default options, overridden by the `PROTOWIRE_SKIP_POLICY`
    /// and `PROTOWIRE_TRACE` environment variables if set.
    pub fn from_env() -> DecodeOptions {
        let mut opts = DecodeOptions::default();
        if let Some(policy) = env::var_os(SKIP_POLICY_VAR) {
            apply_skip_policy(&policy.to_string_lossy(), &mut opts);
        }
        if let Some(trace) = env::var_os(TRACE_VAR) {
            let trace = trace.to_string_lossy();
            match parse_bool(&trace) {
                Some(trace) => opts.trace = trace,
                None => eprintln!("Unrecognized boolean value \"{}\" for {}", trace, TRACE_VAR),
            }
        }
        opts
    }

    /// Set the skip policy.
    pub fn with_skip_policy(mut self, skip_policy: SkipPolicy) -> Self {
        self.skip_policy = skip_policy;
        self
    }

    /// Enable or disable tracing.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// Interpret a string value such as "1" or "no" as a boolean.
fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "1" | "true" | "t" | "yes" | "y" => Some(true),
        "0" | "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parse a skip policy from the `PROTOWIRE_SKIP_POLICY` variable and update
/// `opts`.
///
/// The value is a policy name or a boolean, where true means strict.
fn apply_skip_policy(config: &str, opts: &mut DecodeOptions) {
    let policy = SkipPolicy::parse(config).or_else(|| {
        parse_bool(config).map(|strict| {
            if strict {
                SkipPolicy::Strict
            } else {
                SkipPolicy::Permissive
            }
        })
    });
    match policy {
        Some(policy) => opts.skip_policy = policy,
        None => eprintln!("Unrecognized skip policy \"{}\"", config),
    }
}

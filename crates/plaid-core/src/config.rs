//! Harness configuration.
//!
//! Settings are named strings gathered from the environment and from
//! command-line style arguments (`/Name=value`, `--Name:value`, `-Name=value`).
//! Arguments override environment variables. [`HarnessConfig`] reads the
//! settings the controller understands.

use std::collections::HashMap;
use std::time::Duration;

use plaid_engine::StrategyKind;

/// Environment variables with this prefix become settings.
pub const ENV_PREFIX: &str = "PLAID_";

pub const SKIP_COUNT: &str = "SkipCount";
pub const STOP_ON_FAILURE: &str = "StopOnFailure";
pub const HIDE_COMBINATION_LOG: &str = "HideCombinationLog";
pub const COMBINATION_TIMEOUT: &str = "CombinationTimeout";
pub const STRATEGY: &str = "Strategy";
pub const SEED: &str = "Seed";
pub const TEST: &str = "Test";

const ARG_PREFIXES: [&str; 3] = ["--", "-", "/"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("setting '{name}' must be a non-negative integer, got '{value}'")]
    InvalidCount { name: &'static str, value: String },

    #[error("{0}")]
    UnknownStrategy(String),
}

/// Named settings, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: HashMap<String, String>,
    positional: Vec<String>,
    test_name: Option<String>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings from command-line style tokens only.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_env_and_args(std::iter::empty(), args)
    }

    /// `PLAID_<Name>` variables from `env` first, then `args` on top.
    pub fn from_env_and_args<E, I, S>(env: E, args: I) -> Self
    where
        E: IntoIterator<Item = (String, String)>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut arguments = Self::new();
        for (key, value) in env {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                if !name.is_empty() {
                    arguments.set(name, value);
                }
            }
        }
        for arg in args {
            arguments.push_arg(arg.as_ref());
        }
        arguments
    }

    /// Settings of the running process.
    pub fn from_process() -> Self {
        Self::from_env_and_args(std::env::vars(), std::env::args().skip(1))
    }

    fn push_arg(&mut self, arg: &str) {
        let Some(body) = ARG_PREFIXES.iter().find_map(|p| arg.strip_prefix(p)) else {
            self.positional.push(arg.to_string());
            return;
        };
        // Leftmost of ':' or '=' separates name from value.
        match body.find([':', '=']) {
            Some(split) if split > 0 => self.set(&body[..split], &body[split + 1..]),
            _ => tracing::warn!(argument = arg, "ignoring argument without a value"),
        }
    }

    /// Scope lookups to a test: `get("X")` falls back to `<test>-X`.
    pub fn with_test_name(mut self, test_name: impl Into<String>) -> Self {
        self.test_name = Some(test_name.into());
        self
    }

    /// The scoping test name, or the `Test` setting when none was given.
    pub fn test_name(&self) -> Option<&str> {
        self.test_name
            .as_deref()
            .or_else(|| self.values.get(&TEST.to_ascii_lowercase()).map(String::as_str))
    }

    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.values
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let key = name.to_ascii_lowercase();
        if let Some(value) = self.values.get(&key) {
            return Some(value);
        }
        let test = self.test_name()?;
        self.values
            .get(&format!("{}-{key}", test.to_ascii_lowercase()))
            .map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True only for the value `true`, in any case.
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Integer setting, or `default` when missing or unparsable.
    pub fn get_int(&self, name: &str, default: i64) -> i64 {
        match self.get(name) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(name, value = raw, default, "setting is not an integer, using default");
                default
            }),
        }
    }

    /// Tokens that carried no prefix.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }
}

/// Controller settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarnessConfig {
    /// Leading combinations recorded as skipped without running.
    pub skip_count: u64,
    /// End the run after the first failed combination.
    pub stop_on_failure: bool,
    /// Keep combination lines out of the progress display.
    pub hide_combination_log: bool,
    /// Per-combination time limit in seconds. None = unlimited.
    pub combination_timeout_secs: Option<u64>,
    pub strategy: StrategyKind,
}

impl HarnessConfig {
    pub fn from_arguments(args: &Arguments) -> Result<Self, ConfigError> {
        let skip_count = non_negative(args, SKIP_COUNT)?.unwrap_or(0);
        let combination_timeout_secs = non_negative(args, COMBINATION_TIMEOUT)?.filter(|&s| s > 0);

        let mut strategy = match args.get(STRATEGY) {
            Some(name) => name
                .trim()
                .parse::<StrategyKind>()
                .map_err(ConfigError::UnknownStrategy)?,
            None => StrategyKind::default(),
        };
        if let StrategyKind::Pairwise { seed } = &mut strategy {
            if let Some(s) = non_negative(args, SEED)? {
                *seed = s;
            }
        }

        Ok(Self {
            skip_count,
            stop_on_failure: args.get_bool(STOP_ON_FAILURE),
            hide_combination_log: args.get_bool(HIDE_COMBINATION_LOG),
            combination_timeout_secs,
            strategy,
        })
    }

    pub fn combination_timeout(&self) -> Option<Duration> {
        self.combination_timeout_secs.map(Duration::from_secs)
    }
}

fn non_negative(args: &Arguments, name: &'static str) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = args.get(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidCount {
            name,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_and_separators() {
        let args = Arguments::from_args(["/SkipCount=3", "--Strategy:pairwise", "-Seed=7", "spec.json"]);
        assert_eq!(args.get("SkipCount"), Some("3"));
        assert_eq!(args.get("strategy"), Some("pairwise"));
        assert_eq!(args.get_int("Seed", 0), 7);
        assert_eq!(args.positional(), ["spec.json".to_string()]);
    }

    #[test]
    fn test_leftmost_separator_wins() {
        let args = Arguments::from_args(["/Filter:A=1", "/Path=C:\\temp"]);
        assert_eq!(args.get("Filter"), Some("A=1"));
        assert_eq!(args.get("Path"), Some("C:\\temp"));
    }

    #[test]
    fn test_arguments_override_environment() {
        let env = vec![
            ("PLAID_SkipCount".to_string(), "9".to_string()),
            ("PLAID_STOPONFAILURE".to_string(), "TRUE".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ];
        let args = Arguments::from_env_and_args(env, ["/SkipCount=2"]);
        assert_eq!(args.get_int("SkipCount", 0), 2);
        assert!(args.get_bool("StopOnFailure"));
        assert!(!args.has("HOME"));
    }

    #[test]
    fn test_test_name_scoped_fallback() {
        let args = Arguments::from_args(["/TextEditing-SkipCount=4", "/SkipCount=1"]);
        assert_eq!(args.get("SkipCount"), Some("1"));

        let args = Arguments::from_args(["/TextEditing-StopOnFailure=true"]).with_test_name("TextEditing");
        assert!(args.get_bool("StopOnFailure"));

        let args = Arguments::from_args(["/Test=Wrapping", "/Wrapping-Seed=5"]);
        assert_eq!(args.test_name(), Some("Wrapping"));
        assert_eq!(args.get_int("Seed", 0), 5);
    }

    #[test]
    fn test_get_bool_and_int_defaults() {
        let mut args = Arguments::new();
        args.set("Flag", "yes");
        args.set("Count", "many");
        assert!(!args.get_bool("Flag"));
        assert!(!args.get_bool("Missing"));
        assert_eq!(args.get_int("Count", 11), 11);
        assert_eq!(args.get_int("Missing", -1), -1);
    }

    #[test]
    fn test_harness_config_from_arguments() {
        let args = Arguments::from_args([
            "/SkipCount=5",
            "/StopOnFailure=true",
            "/HideCombinationLog=True",
            "/CombinationTimeout=30",
            "/Strategy=pairwise",
            "/Seed=99",
        ]);
        let config = HarnessConfig::from_arguments(&args).unwrap();
        assert_eq!(config.skip_count, 5);
        assert!(config.stop_on_failure);
        assert!(config.hide_combination_log);
        assert_eq!(config.combination_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.strategy, StrategyKind::Pairwise { seed: 99 });

        let defaults = HarnessConfig::from_arguments(&Arguments::new()).unwrap();
        assert_eq!(defaults, HarnessConfig::default());
    }

    #[test]
    fn test_harness_config_rejects_bad_values() {
        let args = Arguments::from_args(["/SkipCount=-1"]);
        assert!(matches!(
            HarnessConfig::from_arguments(&args),
            Err(ConfigError::InvalidCount { name: SKIP_COUNT, .. })
        ));

        let args = Arguments::from_args(["/Strategy=random"]);
        assert!(matches!(
            HarnessConfig::from_arguments(&args),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }
}

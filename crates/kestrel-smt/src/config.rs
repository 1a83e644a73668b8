//! Configuration for the incremental solver session

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How to launch and drive the solver subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Command line of the solver, program first
    pub command: Vec<String>,
    /// SMT-LIB logic sent during the handshake
    pub logic: String,
    /// When set, every command is also written to this file
    pub dump_path: Option<PathBuf>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            command: vec!["z3".to_string(), "-smt2".to_string(), "-in".to_string()],
            logic: "QF_AUFBV".to_string(),
            dump_path: None,
        }
    }
}

impl SolverConfig {
    /// A config launching a specific solver binary with z3-style flags.
    pub fn with_solver(path: impl Into<PathBuf>) -> Self {
        Self {
            command: vec![
                path.into().to_string_lossy().into_owned(),
                "-smt2".to_string(),
                "-in".to_string(),
            ],
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.command[0], "z3");
        assert_eq!(config.logic, "QF_AUFBV");
        assert!(config.dump_path.is_none());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = SolverConfig {
            command: vec!["cvc5".to_string(), "--incremental".to_string()],
            logic: "QF_AUFBV".to_string(),
            dump_path: Some(PathBuf::from("/tmp/session.smt2")),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.command, config.command);
        assert_eq!(back.dump_path, config.dump_path);
    }
}

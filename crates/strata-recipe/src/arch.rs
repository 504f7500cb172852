//! CPU architecture identification for per-architecture dependency versions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{RecipeError, RecipeResult};

/// CPU architecture a build runs on.
///
/// The string forms match the labels used in per-architecture version
/// keys (`arch=x86_64`, `arch=POWER`, ...), so parsing and display are
/// round-trip safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CpuArch {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "AARCH64")]
    Aarch64,
    #[serde(rename = "POWER")]
    Power,
    #[serde(rename = "RISCV64")]
    RiscV64,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl CpuArch {
    /// Detect the architecture of the host this process runs on.
    pub fn detect() -> Self {
        match std::env::consts::ARCH {
            "x86_64" => CpuArch::X86_64,
            "aarch64" => CpuArch::Aarch64,
            "powerpc64" => CpuArch::Power,
            "riscv64" => CpuArch::RiscV64,
            _ => CpuArch::Unknown,
        }
    }

    /// Label used in version keys and module contexts.
    pub fn as_str(&self) -> &'static str {
        match self {
            CpuArch::X86_64 => "x86_64",
            CpuArch::Aarch64 => "AARCH64",
            CpuArch::Power => "POWER",
            CpuArch::RiscV64 => "RISCV64",
            CpuArch::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CpuArch {
    type Err = RecipeError;

    fn from_str(s: &str) -> RecipeResult<Self> {
        match s {
            "x86_64" => Ok(CpuArch::X86_64),
            "AARCH64" => Ok(CpuArch::Aarch64),
            "POWER" => Ok(CpuArch::Power),
            "RISCV64" => Ok(CpuArch::RiscV64),
            "UNKNOWN" => Ok(CpuArch::Unknown),
            other => Err(RecipeError::UnknownArchitecture(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CpuArch::X86_64, "x86_64")]
    #[case(CpuArch::Aarch64, "AARCH64")]
    #[case(CpuArch::Power, "POWER")]
    #[case(CpuArch::RiscV64, "RISCV64")]
    fn test_display_and_parse_round_trip(#[case] arch: CpuArch, #[case] label: &str) {
        assert_eq!(arch.to_string(), label);
        assert_eq!(label.parse::<CpuArch>().unwrap(), arch);
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = "sparc".parse::<CpuArch>().unwrap_err();
        assert!(err.to_string().contains("sparc"));
    }

    #[test]
    fn test_detect_returns_a_named_architecture() {
        // Whatever the host is, detection must map it to a stable label.
        let arch = CpuArch::detect();
        assert!(!arch.as_str().is_empty());
    }
}

//! Module naming: how a resolved build maps to a module name.

use serde::{Deserialize, Serialize};

use crate::toolchain::ToolchainRef;

/// Naming scheme for installed modules.
///
/// A module name is `name<sep>fullversion` where the full version is the
/// software version, the toolchain suffix (absent for the system
/// toolchain), and the version suffix. Hidden modules carry the hidden
/// marker in front of their version segment, e.g. `toy/.0.0-deps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingScheme {
    pub separator: char,
    pub hidden_marker: char,
}

impl Default for NamingScheme {
    fn default() -> Self {
        NamingScheme {
            separator: '/',
            hidden_marker: '.',
        }
    }
}

impl NamingScheme {
    /// Full version string: `version[-tcname-tcversion][versionsuffix]`.
    pub fn full_version(
        &self,
        version: &str,
        versionsuffix: &str,
        toolchain: &ToolchainRef,
    ) -> String {
        format!("{version}{}{versionsuffix}", toolchain.version_suffix())
    }

    /// Full module name, with the hidden marker applied when requested.
    pub fn module_name(
        &self,
        name: &str,
        version: &str,
        versionsuffix: &str,
        toolchain: &ToolchainRef,
        hidden: bool,
    ) -> String {
        let full = self.full_version(version, versionsuffix, toolchain);
        if hidden {
            format!("{name}{}{}{full}", self.separator, self.hidden_marker)
        } else {
            format!("{name}{}{full}", self.separator)
        }
    }

    /// Flat label used for job names and log files, never hidden-marked:
    /// `name-fullversion`.
    pub fn label(
        &self,
        name: &str,
        version: &str,
        versionsuffix: &str,
        toolchain: &ToolchainRef,
    ) -> String {
        format!(
            "{name}-{}",
            self.full_version(version, versionsuffix, toolchain)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("gzip", "1.5", "", ToolchainRef::new("foss", "2018a"), false, "gzip/1.5-foss-2018a")]
    #[case("toy", "0.0", "-deps", ToolchainRef::system(), false, "toy/0.0-deps")]
    #[case("toy", "0.0", "-deps", ToolchainRef::system(), true, "toy/.0.0-deps")]
    #[case("zlib", "1.2.8", "", ToolchainRef::new("GCC", "6.4.0-2.28"), false, "zlib/1.2.8-GCC-6.4.0-2.28")]
    fn test_module_names(
        #[case] name: &str,
        #[case] version: &str,
        #[case] suffix: &str,
        #[case] toolchain: ToolchainRef,
        #[case] hidden: bool,
        #[case] expected: &str,
    ) {
        let naming = NamingScheme::default();
        assert_eq!(
            naming.module_name(name, version, suffix, &toolchain, hidden),
            expected
        );
    }

    #[test]
    fn test_label_never_carries_the_hidden_marker() {
        let naming = NamingScheme::default();
        assert_eq!(
            naming.label("toy", "1.2.3", "", &ToolchainRef::system()),
            "toy-1.2.3"
        );
        assert_eq!(
            naming.label("gzip", "1.5", "", &ToolchainRef::new("foss", "2018a")),
            "gzip-1.5-foss-2018a"
        );
    }
}

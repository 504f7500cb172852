//! Toolchain references and the toolchain hierarchy table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the synthetic bottom toolchain: plain system compilers, no module.
pub const SYSTEM_TOOLCHAIN_NAME: &str = "system";

/// A `(name, version)` reference to a compiler toolchain.
///
/// The system toolchain is spelled `system/system` and compares equal
/// regardless of how it was constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToolchainRef {
    pub name: String,
    pub version: String,
}

impl ToolchainRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        ToolchainRef {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The bottom of every hierarchy.
    pub fn system() -> Self {
        ToolchainRef::new(SYSTEM_TOOLCHAIN_NAME, SYSTEM_TOOLCHAIN_NAME)
    }

    pub fn is_system(&self) -> bool {
        self.name == SYSTEM_TOOLCHAIN_NAME
    }

    /// Suffix this toolchain contributes to a full module version,
    /// e.g. `-foss-2018a`. Empty for the system toolchain.
    pub fn version_suffix(&self) -> String {
        if self.is_system() {
            String::new()
        } else {
            format!("-{}-{}", self.name, self.version)
        }
    }
}

impl fmt::Display for ToolchainRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_system() {
            f.write_str(SYSTEM_TOOLCHAIN_NAME)
        } else {
            write!(f, "{}/{}", self.name, self.version)
        }
    }
}

/// One slot in a toolchain's ancestor list: either a single name, or an
/// ordered alternation of names where the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubtoolchainSpec {
    Single(String),
    AnyOf(Vec<String>),
}

impl SubtoolchainSpec {
    pub fn single(name: impl Into<String>) -> Self {
        SubtoolchainSpec::Single(name.into())
    }

    pub fn any_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SubtoolchainSpec::AnyOf(names.into_iter().map(Into::into).collect())
    }

    /// The candidate names in match order.
    pub fn names(&self) -> &[String] {
        match self {
            SubtoolchainSpec::Single(name) => std::slice::from_ref(name),
            SubtoolchainSpec::AnyOf(names) => names,
        }
    }

    /// The name reported in diagnostics when no alternative matches.
    pub fn primary(&self) -> &str {
        self.names().first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for SubtoolchainSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join("|"))
    }
}

/// Static definition of one toolchain: its name, its immediate
/// subtoolchain layers, and whether it may be absent from a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainDef {
    pub name: String,
    /// Immediate ancestor layers, outermost composition order.
    #[serde(default)]
    pub subtoolchains: Vec<SubtoolchainSpec>,
    /// Optional toolchains resolve to "no version" instead of erroring
    /// when none of their versions appear among the candidates.
    #[serde(default)]
    pub optional: bool,
}

impl ToolchainDef {
    pub fn new(name: impl Into<String>) -> Self {
        ToolchainDef {
            name: name.into(),
            subtoolchains: Vec::new(),
            optional: false,
        }
    }

    pub fn with_subtoolchains(mut self, subtoolchains: Vec<SubtoolchainSpec>) -> Self {
        self.subtoolchains = subtoolchains;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Registry of toolchain definitions, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainTable {
    defs: BTreeMap<String, ToolchainDef>,
}

impl ToolchainTable {
    pub fn new() -> Self {
        ToolchainTable::default()
    }

    /// The well-known GCC/CUDA/MPI family used throughout the tests and
    /// shipped as the default hierarchy:
    ///
    /// ```text
    /// foss ─ gompi ─────────────┐
    /// fosscuda ─ gompic ─ gcccuda ─ GCC ─ GCCcore ─ system
    ///          └ golfc ─┘
    /// ```
    pub fn builtin() -> Self {
        let mut table = ToolchainTable::new();
        table.register(ToolchainDef::new(SYSTEM_TOOLCHAIN_NAME));
        table.register(
            ToolchainDef::new("GCCcore")
                .with_subtoolchains(vec![SubtoolchainSpec::single(SYSTEM_TOOLCHAIN_NAME)])
                .optional(),
        );
        table.register(ToolchainDef::new("GCC").with_subtoolchains(vec![
            SubtoolchainSpec::single("GCCcore"),
            SubtoolchainSpec::single(SYSTEM_TOOLCHAIN_NAME),
        ]));
        table.register(
            ToolchainDef::new("gcccuda")
                .with_subtoolchains(vec![SubtoolchainSpec::single("GCC")]),
        );
        table.register(
            ToolchainDef::new("gompi").with_subtoolchains(vec![SubtoolchainSpec::single("GCC")]),
        );
        table.register(
            ToolchainDef::new("gompic")
                .with_subtoolchains(vec![SubtoolchainSpec::single("gcccuda")]),
        );
        table.register(
            ToolchainDef::new("golfc")
                .with_subtoolchains(vec![SubtoolchainSpec::single("gcccuda")])
                .optional(),
        );
        table.register(
            ToolchainDef::new("foss").with_subtoolchains(vec![SubtoolchainSpec::single("gompi")]),
        );
        table.register(ToolchainDef::new("fosscuda").with_subtoolchains(vec![
            SubtoolchainSpec::single("gompic"),
            SubtoolchainSpec::single("golfc"),
        ]));
        table
    }

    /// Register a definition, replacing any previous one of the same name.
    pub fn register(&mut self, def: ToolchainDef) {
        self.defs.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&ToolchainDef> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.defs.get(name).is_some_and(|def| def.optional)
    }

    /// Names of all toolchains flagged optional.
    pub fn optional_names(&self) -> BTreeSet<String> {
        self.defs
            .values()
            .filter(|def| def.optional)
            .map(|def| def.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

//! Spec-file schema.
//!
//! A spec file holds an ordered `items` array. Every item carries a `kind`
//! naming the declaration it stands for; the remaining fields depend on the
//! kind. The same schema is read from TOML and JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One parsed spec file or required fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptModule {
    /// Environment variables exported to every command of the module
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Declarations, in order
    #[serde(default)]
    pub items: Vec<ScriptItem>,
}

/// A declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptItem {
    Describe(SuiteItem),
    Xdescribe(SuiteItem),
    It(CommandItem),
    Fit(NamedItem),
    Xit(NamedItem),
    Xmit(NamedItem),
    Cit(ConditionalItem),
    Rit(CommandItem),
    Mit(GeneratorItem),
    Mdescribe(GeneratorSuiteItem),
    #[serde(alias = "before_all")]
    Before(HookItem),
    #[serde(alias = "after_all")]
    After(HookItem),
    #[serde(alias = "beforeEach")]
    BeforeEach(HookItem),
    #[serde(alias = "afterEach")]
    AfterEach(HookItem),
    Require(RequireItem),
}

impl ScriptItem {
    /// The declared name, if the kind has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            ScriptItem::Describe(item) | ScriptItem::Xdescribe(item) => Some(&item.name),
            ScriptItem::It(item) | ScriptItem::Rit(item) => Some(&item.name),
            ScriptItem::Fit(item) | ScriptItem::Xit(item) | ScriptItem::Xmit(item) => {
                Some(&item.name)
            }
            ScriptItem::Cit(item) => Some(&item.name),
            ScriptItem::Mit(item) => Some(&item.name),
            ScriptItem::Mdescribe(item) => Some(&item.name),
            ScriptItem::Before(item)
            | ScriptItem::After(item)
            | ScriptItem::BeforeEach(item)
            | ScriptItem::AfterEach(item) => item.name.as_deref(),
            ScriptItem::Require(_) => None,
        }
    }
}

/// Checks applied to a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandExpectation {
    /// Expected exit status, zero when absent
    #[serde(default)]
    pub status: Option<i32>,

    #[serde(default)]
    pub stdout_contains: Option<String>,

    #[serde(default)]
    pub stdout_equals: Option<String>,

    #[serde(default)]
    pub stderr_contains: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteItem {
    pub name: String,

    /// Deadline override in milliseconds
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub items: Vec<ScriptItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandItem {
    pub name: String,

    /// Shell command forming the body
    pub run: String,

    #[serde(default)]
    pub expect: CommandExpectation,

    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedItem {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalItem {
    pub name: String,

    /// Literal condition
    #[serde(default)]
    pub when: Option<bool>,

    /// Command whose zero exit status makes the condition true
    #[serde(default)]
    pub when_run: Option<String>,

    pub run: String,

    #[serde(default)]
    pub expect: CommandExpectation,

    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorItem {
    pub name: String,

    /// Literal values
    #[serde(default)]
    pub values: Option<Vec<Value>>,

    /// Command printing the values
    #[serde(default)]
    pub generate: Option<String>,

    pub run: String,

    #[serde(default)]
    pub expect: CommandExpectation,

    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSuiteItem {
    pub name: String,

    #[serde(default)]
    pub values: Option<Vec<Value>>,

    #[serde(default)]
    pub generate: Option<String>,

    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub items: Vec<ScriptItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookItem {
    #[serde(default)]
    pub name: Option<String>,

    pub run: String,

    #[serde(default)]
    pub expect: CommandExpectation,

    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequireItem {
    /// Specifier, relative to the requiring file
    pub path: String,
}

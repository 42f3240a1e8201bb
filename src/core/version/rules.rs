// ─── Applicability Rules ───
// Evaluates the `rules` arrays attached to libraries and arguments.
//
// Only two shapes are understood:
//   [allow]            → applies when its os/arch constraint matches the host
//   [allow, disallow]  → applies unless the disallow's constraint matches
// Anything else is rejected for libraries and accepted for arguments.

use serde::{Deserialize, Serialize};

use crate::core::platform::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// Version pattern; any value is read as "requires a recent OS".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// What the rules are gating. Decides how unrecognized shapes resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    Library,
    Argument,
}

impl RuleTarget {
    fn fallback(self) -> bool {
        match self {
            RuleTarget::Library => false,
            RuleTarget::Argument => true,
        }
    }
}

/// Whether `rules` allow the item on `platform`. No rules means allowed.
pub fn rules_allow(rules: &[Rule], platform: &Platform, target: RuleTarget) -> bool {
    match rules {
        [] => true,
        [only] if only.action == RuleAction::Allow => describes_host(only, platform),
        [first, second]
            if first.action == RuleAction::Allow && second.action == RuleAction::Disallow =>
        {
            !describes_host(second, platform)
        }
        _ => target.fallback(),
    }
}

/// A rule describes the host when it has no constraint, or every constraint
/// it has is satisfied. Feature constraints are never satisfied.
fn describes_host(rule: &Rule, platform: &Platform) -> bool {
    if rule.features.is_some() {
        return false;
    }
    match &rule.os {
        None => true,
        Some(os) => os_matches(os, platform),
    }
}

fn os_matches(os: &OsRule, platform: &Platform) -> bool {
    if let Some(name) = &os.name {
        if name != platform.os.rule_name() {
            return false;
        }
    }

    if let Some(arch) = &os.arch {
        let host_arch = platform.arch.rule_name();
        let matches = arch == host_arch || (arch == "x86" && platform.arch.bits() == "32");
        if !matches {
            return false;
        }
    }

    if os.version.is_some() && !platform.is_recent_os() {
        return false;
    }

    true
}

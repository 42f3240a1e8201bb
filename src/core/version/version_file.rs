// ─── Version File ───
// Typed Mojang version JSON: libraries, natives, argument templates.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::rules::{rules_allow, Rule, RuleTarget};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;
use crate::core::platform::Platform;

/// Runtime component used when a version does not declare one.
pub const DEFAULT_RUNTIME_COMPONENT: &str = "jre-legacy";

/// A fully parsed Mojang version JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: String,
    pub main_class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<VersionDownloads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<AssetIndexInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<JavaVersionInfo>,
    /// Fields this crate does not interpret, kept so derived manifests
    /// round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<DownloadArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

// ─── Argument Templates ───

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<ArgumentValue>,
    #[serde(default)]
    pub jvm: Vec<ArgumentValue>,
}

/// A structured argument: either a literal, or a value gated by rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Plain(String),
    Conditional { rules: Vec<Rule>, value: ArgValues },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValues {
    One(String),
    Many(Vec<String>),
}

impl ArgumentValue {
    /// The literal strings this item contributes on `platform`.
    pub fn resolve(&self, platform: &Platform) -> Vec<String> {
        match self {
            ArgumentValue::Plain(value) => vec![value.clone()],
            ArgumentValue::Conditional { rules, value } => {
                if !rules_allow(rules, platform, RuleTarget::Argument) {
                    return vec![];
                }
                match value {
                    ArgValues::One(v) => vec![v.clone()],
                    ArgValues::Many(vs) => vs.clone(),
                }
            }
        }
    }
}

/// Flatten a structured argument list for `platform`.
pub fn resolve_arguments(items: &[ArgumentValue], platform: &Platform) -> Vec<String> {
    items.iter().flat_map(|item| item.resolve(platform)).collect()
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natives: Option<BTreeMap<String, String>>,
    /// Repository base for coordinate-only libraries (legacy loader profiles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serverreq: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clientreq: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifiers: Option<BTreeMap<String, LibraryArtifact>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: String,
}

impl LibraryEntry {
    /// Evaluate whether this library applies to `platform`.
    pub fn is_allowed(&self, platform: &Platform) -> bool {
        match &self.rules {
            Some(rules) => rules_allow(rules, platform, RuleTarget::Library),
            None => true,
        }
    }

    /// Native classifier for `platform`, with `${arch}` substituted.
    pub fn native_classifier(&self, platform: &Platform) -> Option<String> {
        self.natives
            .as_ref()?
            .get(platform.os.rule_name())
            .map(|c| c.replace("${arch}", platform.arch.bits()))
    }

    pub fn is_native(&self) -> bool {
        self.natives.is_some()
    }

    pub fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    pub fn classifier(&self, classifier: &str) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.classifiers.as_ref()?.get(classifier)
    }

    pub fn coordinate(&self) -> LauncherResult<MavenArtifact> {
        MavenArtifact::parse(&self.name)
    }

    /// The library carries a URL that points at the artifact itself.
    pub fn has_direct_url(&self) -> bool {
        self.artifact().is_some_and(|a| !a.url.trim().is_empty())
    }

    /// Legacy profiles mark libraries that ship inside the client with no
    /// requirement flags, no URL and no download block.
    pub fn is_required(&self) -> bool {
        self.serverreq.unwrap_or(false)
            || self.clientreq.unwrap_or(false)
            || self.url.is_some()
            || self.downloads.is_some()
    }
}

impl VersionJson {
    /// Parse a version JSON, failing on structurally invalid documents.
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        serde_json::from_str(raw).map_err(|e| LauncherError::invalid("version manifest", e))
    }

    /// Save the raw version JSON as `<dir>/<id>.json`.
    pub async fn save_to(raw_json: &str, dir: &Path, version_id: &str) -> LauncherResult<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| LauncherError::io(dir, e))?;
        let path = dir.join(format!("{}.json", version_id));
        tokio::fs::write(&path, raw_json)
            .await
            .map_err(|e| LauncherError::Io { path, source: e })?;
        Ok(())
    }

    pub fn client_download(&self) -> Option<&DownloadArtifact> {
        self.downloads.as_ref()?.client.as_ref()
    }

    /// Managed runtime component this version asks for.
    pub fn runtime_component(&self) -> &str {
        self.java_version
            .as_ref()
            .and_then(|j| j.component.as_deref())
            .unwrap_or(DEFAULT_RUNTIME_COMPONENT)
    }

    pub fn asset_index_id(&self) -> &str {
        self.asset_index
            .as_ref()
            .map(|a| a.id.as_str())
            .or(self.assets.as_deref())
            .unwrap_or("legacy")
    }

    /// Pre-1.6 style assets that must be mirrored into `resources/`.
    pub fn uses_legacy_assets(&self) -> bool {
        matches!(self.assets.as_deref(), Some("legacy") | Some("pre-1.6"))
    }

    /// The `x` in `1.x[.y]`, when the id is a release-style version.
    pub fn minor_version(&self) -> Option<u32> {
        let mut parts = self.id.split('.');
        if parts.next()? != "1" {
            return None;
        }
        parts
            .next()?
            .split(|c: char| !c.is_ascii_digit())
            .next()?
            .parse()
            .ok()
    }

    /// Copy of this manifest under a new id with no libraries, used when a
    /// loader is merged straight into the client archive.
    pub fn derive_overlay(&self, id: &str) -> VersionJson {
        let mut derived = self.clone();
        derived.id = id.to_string();
        derived.libraries = Vec::new();
        derived
    }

    /// Legacy `minecraftArguments`, split on whitespace.
    pub fn legacy_game_args(&self) -> Option<Vec<String>> {
        self.minecraft_arguments
            .as_ref()
            .map(|s| s.split_whitespace().map(ToString::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{ArchKind, HostEnvironment, OsKind, StaticHost};

    fn linux() -> Platform {
        StaticHost::new(OsKind::Linux, ArchKind::X64).platform().unwrap()
    }

    fn sample() -> VersionJson {
        serde_json::from_value(serde_json::json!({
            "id": "1.20.1",
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": {"id": "5", "url": "https://example.com/5.json", "sha1": "x", "size": 1, "totalSize": 2},
            "javaVersion": {"component": "java-runtime-gamma", "majorVersion": 17},
            "complianceLevel": 1,
            "arguments": {
                "game": [
                    "--username",
                    "${auth_player_name}",
                    {
                        "rules": [{"action": "allow", "os": {"name": "linux"}}],
                        "value": ["--demo"]
                    },
                    {
                        "rules": [{"action": "allow", "os": {"name": "windows"}}],
                        "value": "--should-not-appear"
                    }
                ],
                "jvm": []
            },
            "libraries": [
                {
                    "name": "org.lwjgl:lwjgl:3.3.1",
                    "natives": {"linux": "natives-linux", "windows": "natives-windows-${arch}"},
                    "rules": [{"action": "allow"}, {"action": "disallow", "os": {"name": "osx"}}]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn structured_arguments_are_rule_gated() {
        let version = sample();
        let args = resolve_arguments(&version.arguments.as_ref().unwrap().game, &linux());
        assert_eq!(args, vec!["--username", "${auth_player_name}", "--demo"]);
    }

    #[test]
    fn native_classifier_substitutes_arch() {
        let version = sample();
        let lib = &version.libraries[0];
        assert!(lib.is_allowed(&linux()));
        assert_eq!(lib.native_classifier(&linux()).as_deref(), Some("natives-linux"));

        let win32 = StaticHost::new(OsKind::Windows, ArchKind::X86).platform().unwrap();
        assert_eq!(
            lib.native_classifier(&win32).as_deref(),
            Some("natives-windows-32")
        );
    }

    #[test]
    fn runtime_component_and_minor_version() {
        let version = sample();
        assert_eq!(version.runtime_component(), "java-runtime-gamma");
        assert_eq!(version.minor_version(), Some(20));
        assert_eq!(version.asset_index_id(), "5");

        let mut snapshot = version.clone();
        snapshot.id = "23w31a".into();
        snapshot.java_version = None;
        assert_eq!(snapshot.minor_version(), None);
        assert_eq!(snapshot.runtime_component(), DEFAULT_RUNTIME_COMPONENT);
    }

    #[test]
    fn overlay_derivation_keeps_unknown_fields() {
        let derived = sample().derive_overlay("forge-14.23.5");
        assert_eq!(derived.id, "forge-14.23.5");
        assert!(derived.libraries.is_empty());

        let value = serde_json::to_value(&derived).unwrap();
        assert_eq!(value["complianceLevel"], 1);
        assert_eq!(value["mainClass"], "net.minecraft.client.main.Main");
    }

    #[test]
    fn invalid_manifest_is_reported() {
        let err = VersionJson::parse(r#"{"id": "1.0"}"#).unwrap_err();
        assert_eq!(err.code(), "INVALID_MANIFEST");
    }
}

use serde::{Deserialize, Serialize};

pub const OFFLINE_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Identity handed to the game. Obtaining it is the caller's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub uuid: String,
    pub access_token: String,
    #[serde(default)]
    pub client_token: Option<String>,
    #[serde(default)]
    pub user_properties: Option<serde_json::Value>,
    #[serde(default)]
    pub meta: AccountMeta,
    #[serde(default)]
    pub xbox: Option<XboxIdentity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountMeta {
    /// `msa`, `mojang` or `legacy`.
    #[serde(rename = "type")]
    pub account_type: String,
}

impl Default for AccountMeta {
    fn default() -> Self {
        Self {
            account_type: "legacy".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XboxIdentity {
    pub xuid: String,
}

impl Account {
    pub fn offline(name: &str) -> Self {
        let name = name.trim();
        Self {
            name: if name.is_empty() { "Player".into() } else { name.into() },
            uuid: OFFLINE_UUID.into(),
            access_token: "offline_access_token".into(),
            client_token: None,
            user_properties: None,
            meta: AccountMeta::default(),
            xbox: None,
        }
    }

    pub fn client_id(&self) -> &str {
        self.client_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.access_token)
    }

    pub fn xuid(&self) -> &str {
        self.xbox
            .as_ref()
            .map(|x| x.xuid.as_str())
            .filter(|x| !x.is_empty())
            .unwrap_or(&self.access_token)
    }

    /// `user_type` token. 1.16 clients expect `Xbox` for Microsoft accounts.
    pub fn user_type(&self, version_id: &str) -> String {
        let is_1_16 = version_id == "1.16" || version_id.starts_with("1.16.");
        if is_1_16 && self.meta.account_type == "msa" {
            "Xbox".into()
        } else {
            self.meta.account_type.clone()
        }
    }

    pub fn user_properties_json(&self) -> String {
        match &self.user_properties {
            Some(value) => value.to_string(),
            None => "{}".into(),
        }
    }
}

//! Inventory host model.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::platform::RetrievalMethod;

/// A managed device, as supplied by the caller's inventory.
///
/// Read-only to the pipeline. The password is held as a [`SecretString`]
/// and is never logged or placed in template context.
#[derive(Debug, Deserialize)]
pub struct Host {
    /// Inventory name, used as the reporting subject.
    pub name: String,

    /// Literal IP address or DNS name.
    pub hostname: String,

    /// Platform identifier (e.g. "cisco_ios", "juniper_junos").
    pub platform: String,

    /// Login username.
    #[serde(default)]
    pub username: String,

    /// Login password.
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,

    /// Management port override.
    #[serde(default)]
    pub port: Option<u16>,

    /// Retrieval method override.
    #[serde(default)]
    pub retrieval: Option<RetrievalMethod>,

    /// Free-form host data, exposed to templates.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Host {
    /// Create a host with no credentials.
    pub fn new(
        name: impl Into<String>,
        hostname: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            platform: platform.into(),
            username: String::new(),
            password: None,
            port: None,
            retrieval: None,
            data: Map::new(),
        }
    }

    /// Set the username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set the management port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Force a retrieval method for this host.
    pub fn with_retrieval(mut self, method: RetrievalMethod) -> Self {
        self.retrieval = Some(method);
        self
    }

    /// Add a template data entry.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Expose the password, if one is set.
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.expose_secret())
    }

    /// Template context: host data plus `name`, `hostname` and `platform`.
    ///
    /// Explicit data entries win over the identity fields.
    pub fn template_context(&self) -> Value {
        let mut context = Map::new();
        context.insert("name".into(), Value::String(self.name.clone()));
        context.insert("hostname".into(), Value::String(self.hostname.clone()));
        context.insert("platform".into(), Value::String(self.platform.clone()));
        for (key, value) in &self.data {
            context.insert(key.clone(), value.clone());
        }
        Value::Object(context)
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

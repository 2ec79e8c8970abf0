//! Client identity codec

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Separator between the identity fields
pub const ID_SEPARATOR: char = '_';

/// Prefix of the user field for gateway-generated (unauthenticated) identities
pub const TEMP_ID_PREFIX: &str = "tmp@";

/// Field positions
pub const GATEWAY_FIELD: usize = 0;
pub const USER_FIELD: usize = 1;
pub const DEVICE_FIELD: usize = 2;

/// How `set_gateway`/`set_device` decide that a replacement is a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldMatch {
    /// Refuse when the whole identity string starts (gateway) or ends (device)
    /// with the new value. Matches deployed gateways, including the false
    /// positives: an empty value or a value that only shares a prefix with
    /// another field is refused as well.
    #[default]
    Legacy,

    /// Refuse only when the target field already equals the new value
    Strict,
}

/// Client identity: `<gateway>_<user>_<device>`
///
/// - gateway: id of the gateway the connection lives on, may be empty
/// - user: business user id, or `tmp@...` for a connection that has not authenticated
/// - device: device/client type discriminator, may be empty
///
/// Field values must not contain `_`. Nothing checks this: an identity built
/// from such a value renders to a string that parses back into different fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ClientId(Repr);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr {
    Fields([String; 3]),
    /// Parsed string that did not split into exactly three fields
    Malformed(String),
}

impl ClientId {
    /// Build an identity from its three fields
    pub fn new(gateway: impl Into<String>, user: impl Into<String>, device: impl Into<String>) -> Self {
        Self(Repr::Fields([gateway.into(), user.into(), device.into()]))
    }

    /// Identity with only the user field set
    pub fn anonymous(user: impl Into<String>) -> Self {
        Self::new("", user, "")
    }

    /// Fresh temporary identity for a connection that has not authenticated yet
    pub fn temporary() -> Self {
        Self::anonymous(format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4().simple()))
    }

    /// Parse the string form
    ///
    /// Never fails: a string without exactly three fields is kept as is and
    /// rejects field replacement.
    pub fn parse(s: &str) -> Self {
        let fields: Vec<&str> = s.split(ID_SEPARATOR).collect();
        match fields.as_slice() {
            [gateway, user, device] => Self::new(*gateway, *user, *device),
            _ => Self(Repr::Malformed(s.to_string())),
        }
    }

    /// Positional field, or "" if the identity has fewer fields
    pub fn field(&self, index: usize) -> &str {
        match &self.0 {
            Repr::Fields(fields) => fields.get(index).map(String::as_str).unwrap_or(""),
            Repr::Malformed(raw) => raw.split(ID_SEPARATOR).nth(index).unwrap_or(""),
        }
    }

    pub fn gateway(&self) -> &str {
        self.field(GATEWAY_FIELD)
    }

    pub fn user(&self) -> &str {
        self.field(USER_FIELD)
    }

    pub fn device(&self) -> &str {
        self.field(DEVICE_FIELD)
    }

    /// True if the user field carries the temporary prefix
    pub fn is_temporary(&self) -> bool {
        self.user().starts_with(TEMP_ID_PREFIX)
    }

    /// True if the identity splits into exactly three fields
    pub fn is_well_formed(&self) -> bool {
        matches!(self.0, Repr::Fields(_))
    }

    /// Replace the gateway field using the legacy no-op check
    pub fn set_gateway(&mut self, gateway: &str) -> bool {
        self.set_gateway_with(gateway, FieldMatch::Legacy)
    }

    /// Replace the device field using the legacy no-op check
    pub fn set_device(&mut self, device: &str) -> bool {
        self.set_device_with(device, FieldMatch::Legacy)
    }

    /// Replace the gateway field. Returns false and leaves the identity untouched
    /// if it is malformed or `mode` considers the value already set.
    pub fn set_gateway_with(&mut self, gateway: &str, mode: FieldMatch) -> bool {
        let unchanged = match mode {
            FieldMatch::Legacy => self.to_string().starts_with(gateway),
            FieldMatch::Strict => self.gateway() == gateway,
        };
        !unchanged && self.replace(GATEWAY_FIELD, gateway)
    }

    /// Replace the device field. Same contract as `set_gateway_with`.
    pub fn set_device_with(&mut self, device: &str, mode: FieldMatch) -> bool {
        let unchanged = match mode {
            FieldMatch::Legacy => self.to_string().ends_with(device),
            FieldMatch::Strict => self.device() == device,
        };
        !unchanged && self.replace(DEVICE_FIELD, device)
    }

    fn replace(&mut self, index: usize, value: &str) -> bool {
        match &mut self.0 {
            Repr::Fields(fields) => {
                fields[index] = value.to_string();
                true
            }
            Repr::Malformed(_) => false,
        }
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Fields([gateway, user, device]) => {
                write!(f, "{gateway}{ID_SEPARATOR}{user}{ID_SEPARATOR}{device}")
            }
            Repr::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl FromStr for ClientId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ClientId> for String {
    fn from(id: ClientId) -> Self {
        id.to_string()
    }
}

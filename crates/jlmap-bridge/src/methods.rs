//! The closed table of methods script code may invoke on host objects.

use serde::de::DeserializeOwned;

use jlmap_builder::command::ObjectCommand;
use jlmap_core::error::{JlMapError, Result};
use jlmap_core::types::{LatLng, ObjectKind};

/// Method names accepted by `jlObjectBridgeCall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeVerb {
    Remove,
    GetId,
    GetKind,
    GetAttribution,
    GetLatLng,
    SetLatLng,
    SetRadius,
    SetOpacity,
    SetContent,
    BringToFront,
    BringToBack,
}

impl BridgeVerb {
    pub const ALL: [BridgeVerb; 11] = [
        BridgeVerb::Remove,
        BridgeVerb::GetId,
        BridgeVerb::GetKind,
        BridgeVerb::GetAttribution,
        BridgeVerb::GetLatLng,
        BridgeVerb::SetLatLng,
        BridgeVerb::SetRadius,
        BridgeVerb::SetOpacity,
        BridgeVerb::SetContent,
        BridgeVerb::BringToFront,
        BridgeVerb::BringToBack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BridgeVerb::Remove => "remove",
            BridgeVerb::GetId => "getId",
            BridgeVerb::GetKind => "getKind",
            BridgeVerb::GetAttribution => "getAttribution",
            BridgeVerb::GetLatLng => "getLatLng",
            BridgeVerb::SetLatLng => "setLatLng",
            BridgeVerb::SetRadius => "setRadius",
            BridgeVerb::SetOpacity => "setOpacity",
            BridgeVerb::SetContent => "setContent",
            BridgeVerb::BringToFront => "bringToFront",
            BridgeVerb::BringToBack => "bringToBack",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|verb| verb.name() == name)
    }

    /// Registry verbs work on every object; the rest follow the command table.
    pub fn supports(self, kind: ObjectKind) -> bool {
        match self {
            BridgeVerb::GetId | BridgeVerb::GetKind => kind != ObjectKind::Map,
            verb => ObjectCommand::method_supported(verb.name(), kind),
        }
    }

    /// Decode the argument blob into a concrete invocation.
    pub fn bind(self, args_json: Option<&str>) -> Result<BridgeMethod> {
        let method = match self {
            BridgeVerb::GetId => no_argument(self, args_json, BridgeMethod::GetId)?,
            BridgeVerb::GetKind => no_argument(self, args_json, BridgeMethod::GetKind)?,
            BridgeVerb::Remove => command(self, args_json, ObjectCommand::Remove)?,
            BridgeVerb::GetAttribution => command(self, args_json, ObjectCommand::GetAttribution)?,
            BridgeVerb::GetLatLng => command(self, args_json, ObjectCommand::GetLatLng)?,
            BridgeVerb::BringToFront => command(self, args_json, ObjectCommand::BringToFront)?,
            BridgeVerb::BringToBack => command(self, args_json, ObjectCommand::BringToBack)?,
            BridgeVerb::SetLatLng => {
                BridgeMethod::Command(ObjectCommand::SetLatLng(argument::<LatLng>(self, args_json)?))
            }
            BridgeVerb::SetRadius => {
                BridgeMethod::Command(ObjectCommand::SetRadius(argument(self, args_json)?))
            }
            BridgeVerb::SetOpacity => {
                BridgeMethod::Command(ObjectCommand::SetOpacity(argument(self, args_json)?))
            }
            BridgeVerb::SetContent => {
                BridgeMethod::Command(ObjectCommand::SetContent(argument(self, args_json)?))
            }
        };
        Ok(method)
    }
}

/// A verb with its argument decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeMethod {
    /// Answered from the registry without touching the engine.
    GetId,
    GetKind,
    Command(ObjectCommand),
}

/// Look `method_name` up for an object of `kind`.
pub fn resolve(kind: ObjectKind, method_name: &str) -> Result<BridgeVerb> {
    BridgeVerb::from_name(method_name)
        .filter(|verb| verb.supports(kind))
        .ok_or_else(|| JlMapError::UnsupportedMethod {
            kind,
            method: method_name.to_string(),
        })
}

fn no_argument(
    verb: BridgeVerb,
    args_json: Option<&str>,
    method: BridgeMethod,
) -> Result<BridgeMethod> {
    match args_json {
        None => Ok(method),
        Some(raw) => Err(JlMapError::conversion(
            raw,
            format!("{} takes no argument", verb.name()),
        )),
    }
}

fn command(
    verb: BridgeVerb,
    args_json: Option<&str>,
    command: ObjectCommand,
) -> Result<BridgeMethod> {
    no_argument(verb, args_json, BridgeMethod::Command(command))
}

fn argument<T: DeserializeOwned>(verb: BridgeVerb, args_json: Option<&str>) -> Result<T> {
    let raw = args_json.ok_or_else(|| {
        JlMapError::conversion("", format!("{} requires an argument", verb.name()))
    })?;
    serde_json::from_str(raw).map_err(|e| JlMapError::conversion(raw, e))
}

//! Transport envelope and placeholder substitution.

use jlmap_core::error::{JlMapError, Result};
use jlmap_core::protocol::js_string;
use jlmap_core::types::ObjectId;

/// Replaced with the bare target id (`this.{{id}}.remove();`).
pub const ID_PLACEHOLDER: &str = "{{id}}";

/// Replaced with the target id as a quoted JS string.
pub const ID_LITERAL_PLACEHOLDER: &str = "{{id_literal}}";

/// A script template plus the object it addresses, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub target: Option<ObjectId>,
    pub script: String,
}

impl Envelope {
    /// A map-level or bootstrap script with no target object.
    pub fn map(script: impl Into<String>) -> Self {
        Self {
            target: None,
            script: script.into(),
        }
    }

    pub fn targeted(target: ObjectId, script: impl Into<String>) -> Self {
        Self {
            target: Some(target),
            script: script.into(),
        }
    }

    /// Produce the concrete script text.
    pub fn render(&self) -> Result<String> {
        let uses_placeholder =
            self.script.contains(ID_PLACEHOLDER) || self.script.contains(ID_LITERAL_PLACEHOLDER);
        match &self.target {
            Some(id) => Ok(self
                .script
                .replace(ID_LITERAL_PLACEHOLDER, &js_string(id.as_str()))
                .replace(ID_PLACEHOLDER, id.as_str())),
            None if uses_placeholder => Err(JlMapError::MalformedScript(
                "script references the target id but the envelope has no target".into(),
            )),
            None => Ok(self.script.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targeted_substitution() {
        let id = ObjectId::new("circle").unwrap();
        let envelope = Envelope::targeted(id, "this.{{id}}.remove(); log({{id_literal}});");
        assert_eq!(
            envelope.render().unwrap(),
            "this.circle.remove(); log('circle');"
        );
    }

    #[test]
    fn test_map_script_passes_through() {
        let envelope = Envelope::map("this.map.setZoom(3);");
        assert_eq!(envelope.render().unwrap(), "this.map.setZoom(3);");
    }

    #[test]
    fn test_placeholder_without_target_is_malformed() {
        let envelope = Envelope::map("this.{{id}}.remove();");
        assert!(matches!(
            envelope.render().unwrap_err(),
            JlMapError::MalformedScript(_)
        ));
    }
}

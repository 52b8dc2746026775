//! `{name}` placeholders in proposal arguments
//!
//! A string argument that is exactly `"{name}"` resolves to the address of
//! `name` in the current registry. Arrays and objects are walked
//! recursively; other strings pass through untouched.

use serde_json::Value;
use upgrade_registry::{Address, RegistryError, RegistrySnapshot};

/// Name inside a `{name}` placeholder
#[must_use]
pub fn placeholder(text: &str) -> Option<&str> {
    text.strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
}

/// Resolve placeholders in a value
///
/// # Errors
/// Fails with the registry error of the first unresolvable name
pub fn resolve(value: &Value, registry: &RegistrySnapshot) -> Result<Value, RegistryError> {
    match value {
        Value::String(text) => match placeholder(text) {
            Some(name) => Ok(Value::String(registry.address(name)?.to_string())),
            None => Ok(value.clone()),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| resolve(item, registry))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, item)| Ok::<_, RegistryError>((key.clone(), resolve(item, registry)?)))
            .collect::<Result<serde_json::Map<_, _>, _>>()
            .map(Value::Object),
        _ => Ok(value.clone()),
    }
}

/// Resolve a party reference: a literal `0x` address, a `{name}`
/// placeholder or a bare registry name
///
/// # Errors
/// Fails when the name does not resolve to a live resource
pub fn resolve_party(reference: &str, registry: &RegistrySnapshot) -> Result<Address, RegistryError> {
    if let Ok(address) = reference.parse::<Address>() {
        return Ok(address);
    }
    let name = placeholder(reference).unwrap_or(reference);
    registry.address(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use upgrade_registry::{Registry, ResourceHandle, ResourceKind};

    fn registry() -> RegistrySnapshot {
        Registry::from_handles([
            ResourceHandle::new("core", Address::from_low_u64(1), ResourceKind::Core),
            ResourceHandle::new("fei", Address::from_low_u64(2), ResourceKind::Token),
        ])
        .snapshot()
    }

    #[test]
    fn resolves_nested_placeholders() {
        let resolved = resolve(
            &json!({ "token": "{fei}", "path": ["{core}", "literal", 3] }),
            &registry(),
        )
        .unwrap();

        assert_eq!(
            resolved,
            json!({
                "token": Address::from_low_u64(2).to_string(),
                "path": [Address::from_low_u64(1).to_string(), "literal", 3],
            })
        );
    }

    #[test]
    fn unknown_placeholder_fails() {
        let err = resolve(&json!(["{missing}"]), &registry()).unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownResource {
                name: "missing".to_string()
            }
        );
    }

    #[test]
    fn placeholder_shapes() {
        assert_eq!(placeholder("{core}"), Some("core"));
        assert_eq!(placeholder("{}"), None);
        assert_eq!(placeholder("core"), None);
        assert_eq!(placeholder("{a}{b}"), None);
    }

    #[test]
    fn party_references() {
        let registry = registry();
        assert_eq!(resolve_party("core", &registry).unwrap(), Address::from_low_u64(1));
        assert_eq!(resolve_party("{fei}", &registry).unwrap(), Address::from_low_u64(2));
        assert_eq!(
            resolve_party("0x0000000000000000000000000000000000000009", &registry).unwrap(),
            Address::from_low_u64(9)
        );
    }
}

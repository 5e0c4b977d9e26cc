//! Node, namespace and topic name validation and resolution

use super::{MiddlewareError, MwResult, RetCode};

/// Maximum node name length accepted
pub const MAX_NODE_NAME_LENGTH: usize = 255;

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn validate_token(token: &str, code: RetCode, what: &str) -> MwResult<()> {
    if token.is_empty() {
        return Err(MiddlewareError::new(code, format!("{} has an empty token", what)));
    }
    if token.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(MiddlewareError::new(
            code,
            format!("{} token '{}' starts with a digit", what, token),
        ));
    }
    if let Some(bad) = token.chars().find(|c| !is_token_char(*c)) {
        return Err(MiddlewareError::new(
            code,
            format!("{} contains invalid character '{}'", what, bad),
        ));
    }
    Ok(())
}

/// Check a node name: `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate_node_name(name: &str) -> MwResult<()> {
    if name.len() > MAX_NODE_NAME_LENGTH {
        return Err(MiddlewareError::new(
            RetCode::NodeInvalidName,
            format!("node name longer than {} characters", MAX_NODE_NAME_LENGTH),
        ));
    }
    validate_token(name, RetCode::NodeInvalidName, "node name")
}

/// Check a namespace and return its canonical form (`/` for empty)
pub fn normalize_namespace(namespace: &str) -> MwResult<String> {
    if namespace.is_empty() || namespace == "/" {
        return Ok("/".to_string());
    }
    let rest = namespace.strip_prefix('/').ok_or_else(|| {
        MiddlewareError::new(
            RetCode::NodeInvalidNamespace,
            format!("namespace '{}' must be absolute", namespace),
        )
    })?;
    for token in rest.split('/') {
        validate_token(token, RetCode::NodeInvalidNamespace, "namespace")?;
    }
    Ok(namespace.to_string())
}

/// Resolve `topic` against a node's namespace and name.
///
/// Absolute names are kept, `~` expands to the node's fully qualified name,
/// anything else is placed under the namespace.
pub fn resolve_topic(topic: &str, namespace: &str, node_name: &str) -> MwResult<String> {
    let invalid = |message: String| MiddlewareError::new(RetCode::TopicNameInvalid, message);

    if topic.is_empty() {
        return Err(invalid("topic name is empty".to_string()));
    }

    let prefix = if namespace == "/" { "" } else { namespace };
    let resolved = if topic.starts_with('/') {
        topic.to_string()
    } else if topic == "~" {
        format!("{}/{}", prefix, node_name)
    } else if let Some(rest) = topic.strip_prefix("~/") {
        format!("{}/{}/{}", prefix, node_name, rest)
    } else {
        format!("{}/{}", prefix, topic)
    };

    if resolved.ends_with('/') {
        return Err(invalid(format!("topic '{}' ends with '/'", topic)));
    }
    for token in resolved[1..].split('/') {
        validate_token(token, RetCode::TopicNameInvalid, "topic")?;
    }
    Ok(resolved)
}

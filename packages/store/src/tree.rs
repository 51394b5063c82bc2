//! Navigation and ensure-and-create traversal over the document tree.
//!
//! The tree is a `serde_json::Value`. References returned by these
//! functions are views into it and must not be held across structural
//! mutations.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::path::Path;

/// Read-only walk to the node at `path`.
///
/// Object segments are key lookups; array segments must be in-bounds
/// base-10 indices. Any other combination is absent. The empty path
/// resolves to the tree itself. Never mutates.
pub fn get_path<'a>(tree: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut cursor = tree;
    for segment in path.iter() {
        cursor = match cursor {
            Value::Object(map) => map.get(segment.as_str())?,
            Value::Array(arr) => arr.get(Path::as_index(segment)?)?,
            _ => return None,
        };
    }
    Some(cursor)
}

/// Mutating walk that creates missing intermediate objects.
///
/// A missing key on an object is created as an empty object and the
/// walk continues; an array is never inferred from a numeric segment
/// (see [`ensure_array_slot`] for explicit index-based creation). An
/// existing scalar at a hop is a type conflict rather than a silent
/// overwrite. Array hops require an in-bounds index. The returned node
/// is assigned in place by the caller; `null` hops are normalized to
/// empty objects so creation can continue through them.
pub fn ensure_path_mut<'a>(tree: &'a mut Value, path: &Path) -> Result<&'a mut Value, Error> {
    let mut cursor = tree;
    for segment in path.iter() {
        if cursor.is_null() {
            *cursor = Value::Object(Map::new());
        }
        cursor = match cursor {
            Value::Object(map) => map.entry(segment.as_str()).or_insert(Value::Null),
            Value::Array(arr) => {
                let index = Path::as_index(segment).ok_or_else(|| Error::TypeConflict {
                    path: path.to_string(),
                    message: format!("segment '{}' is not an array index", segment),
                })?;
                let len = arr.len();
                arr.get_mut(index).ok_or_else(|| Error::TypeConflict {
                    path: path.to_string(),
                    message: format!("array index {} out of bounds (len={})", index, len),
                })?
            }
            _ => {
                return Err(Error::TypeConflict {
                    path: path.to_string(),
                    message: format!("cannot traverse scalar at segment '{}'", segment),
                });
            }
        };
    }
    Ok(cursor)
}

/// Resolve or create the array at `array_path` and return the element
/// at `index`, growing the array with empty-object placeholders for
/// every not-yet-populated slot up to and including `index`.
///
/// An absent destination, a `null`, or an empty object converts to an
/// array; a populated object or a scalar is a type conflict. The empty
/// path is rejected because the document root must stay an object.
pub fn ensure_array_slot<'a>(
    tree: &'a mut Value,
    array_path: &Path,
    index: usize,
) -> Result<&'a mut Value, Error> {
    if array_path.is_empty() {
        return Err(Error::TypeConflict {
            path: String::new(),
            message: "the document root cannot be an array".to_string(),
        });
    }

    let node = ensure_path_mut(tree, array_path)?;
    match node {
        Value::Array(_) => {}
        Value::Null => *node = Value::Array(Vec::new()),
        Value::Object(map) if map.is_empty() => *node = Value::Array(Vec::new()),
        _ => {
            return Err(Error::TypeConflict {
                path: array_path.to_string(),
                message: "existing value is not an array".to_string(),
            });
        }
    }

    let Value::Array(arr) = node else {
        return Err(Error::TypeConflict {
            path: array_path.to_string(),
            message: "existing value is not an array".to_string(),
        });
    };

    while arr.len() <= index {
        arr.push(Value::Object(Map::new()));
    }
    Ok(&mut arr[index])
}

/// Number of keys or elements at `path`; 0 for scalars, absent nodes,
/// and anything else that does not resolve.
pub fn element_count(tree: &Value, path: &Path) -> usize {
    match get_path(tree, path) {
        Some(Value::Object(map)) => map.len(),
        Some(Value::Array(arr)) => arr.len(),
        _ => 0,
    }
}

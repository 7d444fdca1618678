//! JSON-Patch (RFC 6902) builder for partial record updates.
//!
//! [`diff`] describes how to turn a previously fetched record into its edited
//! form. Every `replace` and `remove` is preceded by a `test` asserting the
//! old value, so the API rejects the patch if someone else changed the field
//! in the meantime. Objects recurse field by field; arrays and scalars are
//! compared deeply and replaced whole.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Add,
    Remove,
    Replace,
    Test,
}

/// One JSON-Patch instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: Op,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: Op::Add,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op: Op::Remove,
            path: path.into(),
            value: None,
        }
    }

    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: Op::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn test(path: impl Into<String>, value: Value) -> Self {
        Self {
            op: Op::Test,
            path: path.into(),
            value: Some(value),
        }
    }
}

/// Operations that transform `previous` into `updated`.
///
/// Fields are visited in `previous`'s order (changed, then dropped), and
/// fields new in `updated` are appended in `updated`'s order. Unchanged fields
/// produce nothing, so `diff(x, x)` is empty.
pub fn diff(previous: &Value, updated: &Value) -> Vec<PatchOperation> {
    let mut ops = Vec::new();
    diff_at("", previous, updated, &mut ops);
    ops
}

/// [`diff`] over typed records.
pub fn diff_records<T: Serialize>(
    previous: &T,
    updated: &T,
) -> Result<Vec<PatchOperation>, serde_json::Error> {
    Ok(diff(
        &serde_json::to_value(previous)?,
        &serde_json::to_value(updated)?,
    ))
}

fn diff_at(path: &str, previous: &Value, updated: &Value, ops: &mut Vec<PatchOperation>) {
    if previous == updated {
        return;
    }
    match (previous, updated) {
        (Value::Object(old), Value::Object(new)) => {
            for (key, old_value) in old {
                let child = child_path(path, key);
                match new.get(key) {
                    Some(new_value) => diff_at(&child, old_value, new_value, ops),
                    None => {
                        ops.push(PatchOperation::test(child.clone(), old_value.clone()));
                        ops.push(PatchOperation::remove(child));
                    }
                }
            }
            for (key, new_value) in new {
                if !old.contains_key(key) {
                    ops.push(PatchOperation::add(child_path(path, key), new_value.clone()));
                }
            }
        }
        _ => {
            ops.push(PatchOperation::test(path, previous.clone()));
            ops.push(PatchOperation::replace(path, updated.clone()));
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    format!("{}/{}", parent, key.replace('~', "~0").replace('/', "~1"))
}

fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Apply `ops` to `doc` in order. Stops at the first failing operation; `doc`
/// may then be partially patched, so callers apply to a copy.
pub fn apply(doc: &mut Value, ops: &[PatchOperation]) -> Result<(), PatchError> {
    for op in ops {
        apply_one(doc, op)?;
    }
    Ok(())
}

/// Apply `ops` to a copy of `record`, returning the patched record.
pub fn apply_to<T>(record: &T, ops: &[PatchOperation]) -> Result<T, PatchError>
where
    T: Serialize + serde::de::DeserializeOwned,
{
    let mut value = serde_json::to_value(record)
        .map_err(|e| PatchError::InvalidPointer(format!("unserializable record: {}", e)))?;
    apply(&mut value, ops)?;
    serde_json::from_value(value)
        .map_err(|e| PatchError::InvalidPointer(format!("patched record is invalid: {}", e)))
}

fn apply_one(doc: &mut Value, op: &PatchOperation) -> Result<(), PatchError> {
    let path = op.path.as_str();
    if !path.is_empty() && !path.starts_with('/') {
        return Err(PatchError::InvalidPointer(path.to_string()));
    }
    let missing = || PatchError::MissingPath {
        path: path.to_string(),
    };
    let value = || op.value.clone().unwrap_or(Value::Null);

    match op.op {
        Op::Test => {
            if doc.pointer(path) == Some(&value()) {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: path.to_string(),
                })
            }
        }
        Op::Replace => {
            let target = doc.pointer_mut(path).ok_or_else(missing)?;
            *target = value();
            Ok(())
        }
        Op::Add if path.is_empty() => {
            *doc = value();
            Ok(())
        }
        Op::Add => {
            let (parent, key) = split_parent(path)?;
            match doc.pointer_mut(parent).ok_or_else(missing)? {
                Value::Object(map) => {
                    map.insert(key, value());
                    Ok(())
                }
                Value::Array(items) if key == "-" => {
                    items.push(value());
                    Ok(())
                }
                Value::Array(items) => {
                    let index = array_index(&key, items.len() + 1).ok_or_else(missing)?;
                    items.insert(index, value());
                    Ok(())
                }
                _ => Err(missing()),
            }
        }
        Op::Remove => {
            let (parent, key) = split_parent(path)?;
            match doc.pointer_mut(parent).ok_or_else(missing)? {
                Value::Object(map) => map.shift_remove(&key).map(|_| ()).ok_or_else(missing),
                Value::Array(items) => {
                    let index = array_index(&key, items.len()).ok_or_else(missing)?;
                    items.remove(index);
                    Ok(())
                }
                _ => Err(missing()),
            }
        }
    }
}

fn split_parent(path: &str) -> Result<(&str, String), PatchError> {
    path.rsplit_once('/')
        .map(|(parent, key)| (parent, unescape(key)))
        .ok_or_else(|| PatchError::InvalidPointer(path.to_string()))
}

fn array_index(token: &str, len: usize) -> Option<usize> {
    token.parse::<usize>().ok().filter(|i| *i < len)
}

//! Dotted-path getters.
//!
//! A watcher can track a simple path like `"a.b.c"` over a root value
//! instead of supplying a closure. Each segment is read through the tracked
//! object getter, so the watcher subscribes to every slot along the path.

use crate::error::Error;
use crate::reactive::value::Value;

/// Parse a dot-delimited path into a getter over a root value.
///
/// Only simple paths are accepted (`[A-Za-z0-9_$.]`); anything else returns
/// `Error::Path` - use a closure getter for full control. Missing segments
/// resolve to `Null` rather than failing, so a watcher can observe a path
/// that appears later via `reactive::set`.
pub fn parse_path(path: &str) -> Result<impl Fn(&Value) -> Value + use<>, Error> {
    if path.is_empty()
        || !path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
    {
        return Err(Error::Path(path.to_string()));
    }
    let segments: Vec<String> = path.split('.').map(str::to_string).collect();
    Ok(move |root: &Value| {
        let mut current = root.clone();
        for segment in &segments {
            let next = match &current {
                Value::Obj(obj) => obj.get(segment),
                _ => None,
            };
            match next {
                Some(v) => current = v,
                None => return Value::Null,
            }
        }
        current
    })
}

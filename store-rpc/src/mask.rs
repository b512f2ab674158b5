use serde_json::Value;

use crate::args::Args;
use crate::options::Options;

const LONG_MASK: &str = "******";

/// Partially redact `value`.
///
/// Up to 2 chars are fully starred, up to 6 keep the first and last char,
/// anything longer keeps 3 chars on each side around a fixed-width mask.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    match len {
        0..=2 => "*".repeat(len),
        3..=6 => {
            let mut masked = String::with_capacity(len);
            masked.push(chars[0]);
            masked.push_str(&"*".repeat(len - 2));
            masked.push(chars[len - 1]);
            masked
        }
        _ => {
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[len - 3..].iter().collect();
            format!("{head}{LONG_MASK}{tail}")
        }
    }
}

fn mask_setting(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(mask(s)),
        other => Value::String(mask(&other.to_string())),
    }
}

/// Copy of `args` with every sensitive configuration value redacted.
pub fn mask_args(args: &Args, options: &Options) -> Args {
    let mut masked = args.clone();
    for payload in masked.iter_mut() {
        for (key, value) in payload.store.configuration.iter_mut() {
            if options.is_sensitive(key) {
                *value = mask_setting(value);
            }
        }
    }
    masked
}

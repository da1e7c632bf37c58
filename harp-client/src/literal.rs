//! Python literal decoding
//!
//! Older HARP apps return the controls payload as the `repr` of a Python
//! dict: single-quoted strings and `True`/`False`/`None`. This rewrites such
//! text into JSON; quoting inside strings is preserved.

use serde_json::Value;

/// Decode a string output holding a dict, either JSON or a Python literal
///
/// Anything that does not decode to an object is returned unchanged.
pub(crate) fn decode_output(value: Value) -> Value {
    let Value::String(text) = &value else {
        return value;
    };
    let trimmed = text.trim();
    if !trimmed.starts_with('{') {
        return value;
    }

    let decoded = serde_json::from_str::<Value>(trimmed)
        .or_else(|_| serde_json::from_str::<Value>(&python_to_json(trimmed)));
    match decoded {
        Ok(object @ Value::Object(_)) => object,
        _ => value,
    }
}

/// Rewrite a Python literal as JSON text
fn python_to_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let quote = c;
                out.push('"');
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => {}
                        },
                        c if c == quote => break,
                        '"' => out.push_str("\\\""),
                        c => out.push(c),
                    }
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_python_dict_decoded() {
        let text = "{'ctrls': [{'ctrl_type': 'toggle', 'label': \"Don't clip\", 'value': True}], \
                    'card': {'name': 'X', 'midi_in': False, 'author': None}}";

        let decoded = decode_output(json!(text));
        assert_eq!(
            decoded,
            json!({
                "ctrls": [{"ctrl_type": "toggle", "label": "Don't clip", "value": true}],
                "card": {"name": "X", "midi_in": false, "author": null}
            })
        );
    }

    #[test]
    fn test_words_inside_strings_untouched() {
        let decoded = decode_output(json!("{'label': 'True or False', 'quote': 'say \"hi\"'}"));
        assert_eq!(decoded, json!({"label": "True or False", "quote": "say \"hi\""}));
    }

    #[test]
    fn test_json_string_decoded() {
        let decoded = decode_output(json!("{\"ctrls\": [], \"card\": {\"name\": \"X\"}}"));
        assert_eq!(decoded, json!({"ctrls": [], "card": {"name": "X"}}));
    }

    #[test]
    fn test_other_values_unchanged() {
        assert_eq!(decode_output(json!("plain text")), json!("plain text"));
        assert_eq!(decode_output(json!("{not a dict")), json!("{not a dict"));
        assert_eq!(decode_output(json!([1, 2])), json!([1, 2]));
        assert_eq!(decode_output(json!({"a": 1})), json!({"a": 1}));
    }
}

//! Tolerance for the non-standard number tokens found in company-facts
//! payloads.
//!
//! Some documents carry bare `NaN`, `Infinity` and `-Infinity` where a
//! number is expected, or numeric literals too large for an `f64`. Strict
//! JSON decoding rejects both, so before decoding they are rewritten into
//! string literals; fact coercion then records them as text.

use std::borrow::Cow;

use crate::scalar::NON_FINITE_TOKENS;

/// Quote every bare non-finite token, and every numeric literal that
/// overflows an `f64`, appearing outside a string literal.
///
/// Returns the input unchanged (and unallocated) when there is nothing to
/// rewrite.
pub(crate) fn quote_non_finite(input: &str) -> Cow<'_, str> {
  let bytes = input.as_bytes();
  let mut out = String::new();
  let mut flushed = 0usize;
  let mut in_string = false;
  let mut escaped = false;
  let mut i = 0usize;

  while i < bytes.len() {
    let b = bytes[i];

    if in_string {
      if escaped {
        escaped = false;
      } else if b == b'\\' {
        escaped = true;
      } else if b == b'"' {
        in_string = false;
      }
      i += 1;
      continue;
    }

    if b == b'"' {
      in_string = true;
      i += 1;
      continue;
    }

    let rest = &bytes[i..];
    let len = match NON_FINITE_TOKENS
      .iter()
      .find(|t| rest.starts_with(t.as_bytes()))
    {
      Some(token) => token.len(),
      None if b == b'-' || b.is_ascii_digit() => {
        let len = number_len(rest);
        if !overflows(&input[i..i + len]) {
          i += len;
          continue;
        }
        len
      }
      None => {
        i += 1;
        continue;
      }
    };

    if out.is_empty() {
      out.reserve(input.len() + 16);
    }
    out.push_str(&input[flushed..i]);
    out.push('"');
    out.push_str(&input[i..i + len]);
    out.push('"');
    i += len;
    flushed = i;
  }

  if flushed == 0 {
    return Cow::Borrowed(input);
  }
  out.push_str(&input[flushed..]);
  Cow::Owned(out)
}

fn number_len(rest: &[u8]) -> usize {
  rest
    .iter()
    .take_while(|&&c| matches!(c, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E'))
    .count()
}

fn overflows(literal: &str) -> bool {
  literal.parse::<f64>().is_ok_and(f64::is_infinite)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn untouched_when_no_tokens() {
    let input = r#"{"val": 1.5}"#;
    assert!(matches!(quote_non_finite(input), Cow::Borrowed(_)));
  }

  #[test]
  fn bare_tokens_are_quoted() {
    let input = r#"{"a": NaN, "b": [Infinity, -Infinity]}"#;
    let out = quote_non_finite(input);
    assert_eq!(out, r#"{"a": "NaN", "b": ["Infinity", "-Infinity"]}"#);
  }

  #[test]
  fn overflowing_numbers_are_quoted() {
    let input = r#"{"a": 1e400, "b": -2E+999, "c": 1.5e300, "d": -7}"#;
    let out = quote_non_finite(input);
    assert_eq!(out, r#"{"a": "1e400", "b": "-2E+999", "c": 1.5e300, "d": -7}"#);
  }

  #[test]
  fn huge_integer_is_quoted() {
    let digits = "9".repeat(400);
    let input = format!("[{digits}, 3]");
    assert_eq!(quote_non_finite(&input), format!("[\"{digits}\", 3]"));
  }

  #[test]
  fn tokens_inside_strings_are_left_alone() {
    let input = r#"{"label": "NaN \"Infinity\" text", "val": "NaN"}"#;
    assert!(matches!(quote_non_finite(input), Cow::Borrowed(_)));
  }

  #[test]
  fn multibyte_text_survives() {
    let input = "{\"label\": \"Umsatz – €\", \"val\": NaN}";
    let out = quote_non_finite(input);
    assert_eq!(out, "{\"label\": \"Umsatz – €\", \"val\": \"NaN\"}");
  }
}

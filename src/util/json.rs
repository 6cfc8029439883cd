/*
Copyright 2022 EmeraldPay, Inc

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
use serde::Serialize;
use serde_json::ser::{CharEscape, Formatter, Serializer};
use std::io;

/// JSON formatter producing the same bytes as Go `encoding/json` with HTML escaping enabled,
/// which is what the ledger uses to build transaction digests.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoJsonFormatter;

fn write_control<W: ?Sized + io::Write>(writer: &mut W, b: u8) -> io::Result<()> {
    write!(writer, "\\u{:04x}", b)
}

impl Formatter for GoJsonFormatter {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            if start < i {
                writer.write_all(fragment[start..i].as_bytes())?;
            }
            writer.write_all(escaped.as_bytes())?;
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_char_escape<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        char_escape: CharEscape,
    ) -> io::Result<()> {
        let s: &[u8] = match char_escape {
            CharEscape::Quote => b"\\\"",
            CharEscape::ReverseSolidus => b"\\\\",
            CharEscape::Solidus => b"/",
            CharEscape::LineFeed => b"\\n",
            CharEscape::CarriageReturn => b"\\r",
            CharEscape::Tab => b"\\t",
            // no short forms for \b and \f in Go
            CharEscape::Backspace => return write_control(writer, 0x08),
            CharEscape::FormFeed => return write_control(writer, 0x0c),
            CharEscape::AsciiControl(b) => return write_control(writer, b),
        };
        writer.write_all(s)
    }
}

/// Sequence of JSON values, each one terminated by a newline. Same as calling `Encode` on a Go
/// `json.Encoder` for each value.
#[derive(Debug, Default)]
pub struct JsonLines {
    buf: Vec<u8>,
}

impl JsonLines {
    pub fn new() -> JsonLines {
        JsonLines::default()
    }

    pub fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        let mut ser = Serializer::with_formatter(&mut self.buf, GoJsonFormatter);
        value.serialize(&mut ser)?;
        self.buf.push(b'\n');
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn line<T: Serialize + ?Sized>(value: &T) -> String {
        let mut lines = JsonLines::new();
        lines.push(value).unwrap();
        String::from_utf8(lines.into_bytes()).unwrap()
    }

    #[test]
    fn escapes_html() {
        assert_eq!(line("a<b>&c"), "\"a\\u003cb\\u003e\\u0026c\"\n");
    }

    #[test]
    fn escapes_line_separators() {
        assert_eq!(line("x\u{2028}y\u{2029}"), "\"x\\u2028y\\u2029\"\n");
    }

    #[test]
    fn escapes_control_chars_as_go() {
        assert_eq!(line("\u{8}\u{c}\u{1}"), "\"\\u0008\\u000c\\u0001\"\n");
        assert_eq!(line("a\nb\tc\r"), "\"a\\nb\\tc\\r\"\n");
    }

    #[test]
    fn keeps_quotes_and_unicode() {
        assert_eq!(line("{\"X\":1}"), "\"{\\\"X\\\":1}\"\n");
        assert_eq!(line("привет/1"), "\"привет/1\"\n");
    }

    #[test]
    fn writes_each_value_on_own_line() {
        let mut lines = JsonLines::new();
        lines.push(&0i32).unwrap();
        lines.push(&Option::<Vec<u8>>::None).unwrap();
        lines.push(&false).unwrap();
        assert_eq!(lines.as_bytes(), b"0\nnull\nfalse\n");
    }

    #[test]
    fn sorts_map_keys() {
        let mut map = BTreeMap::new();
        map.insert("key", 1);
        map.insert("Key", 2);
        map.insert("a", 3);
        assert_eq!(line(&map), "{\"Key\":2,\"a\":3,\"key\":1}\n");
    }
}

//! Strict parser for rendered index suggestions.
//!
//! Accepted shape:
//!
//! ```text
//! db.<path>.createIndex({ <key>: <direction>, ... })
//! db.getCollection("<name>").createIndex({ <key>: <direction>, ... })
//! ```
//!
//! Keys are identifiers, dotted identifier paths, or quoted strings. Directions
//! are `1`, `-1`, or one of `"text"`, `"hashed"`, `"2d"`, `"2dsphere"`. The text
//! is only ever read as data.

use mongodb::bson::{Bson, Document};

use super::suggestion::is_identifier;
use crate::error::{Error, Result};
use crate::models::IndexSuggestion;

const CREATE_INDEX: &str = ".createIndex(";
const STRING_DIRECTIONS: [&str; 4] = ["text", "hashed", "2d", "2dsphere"];

/// Parse suggestion text into a collection name and key specification.
pub fn parse_suggestion(text: &str) -> Result<IndexSuggestion> {
    let malformed = || Error::MalformedSuggestion(text.to_string());
    let mut cursor = Cursor::new(text);

    let collection = cursor.collection().ok_or_else(malformed)?;
    let keys = cursor.key_spec().ok_or_else(malformed)?;
    cursor.finish().ok_or_else(malformed)?;

    Ok(IndexSuggestion { collection, keys, source: text.trim().to_string() })
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Option<()> {
        self.eat(token).then_some(())
    }

    /// `db.<path>` or `db.getCollection("<name>")`, followed by `.createIndex(`.
    fn collection(&mut self) -> Option<String> {
        self.expect("db")?;
        if self.eat(".getCollection(") {
            let name = self.string()?;
            self.expect(")")?;
            self.expect(CREATE_INDEX)?;
            return (!name.is_empty()).then_some(name);
        }

        self.expect(".")?;
        let mut segments = vec![self.identifier()?];
        loop {
            if self.eat(CREATE_INDEX) {
                break;
            }
            self.expect(".")?;
            segments.push(self.identifier()?);
        }
        Some(segments.join("."))
    }

    /// `{ key: direction, ... })` with an optional trailing comma.
    fn key_spec(&mut self) -> Option<Document> {
        self.expect("{")?;
        let mut keys = Document::new();
        loop {
            if self.eat("}") {
                break;
            }
            let key = self.key()?;
            self.expect(":")?;
            let direction = self.direction()?;
            if keys.contains_key(&key) {
                return None;
            }
            keys.insert(key, direction);
            if !self.eat(",") {
                self.expect("}")?;
                break;
            }
        }
        self.expect(")")?;
        (!keys.is_empty()).then_some(keys)
    }

    fn finish(&mut self) -> Option<()> {
        self.eat(";");
        self.skip_ws();
        self.rest().is_empty().then_some(())
    }

    fn identifier(&mut self) -> Option<String> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(rest.len());
        let ident = &rest[..len];
        if !is_identifier(ident) {
            return None;
        }
        self.pos += len;
        Some(ident.to_string())
    }

    fn key(&mut self) -> Option<String> {
        self.skip_ws();
        let key = if self.rest().starts_with(['"', '\'']) {
            self.string()?
        } else {
            let mut path = vec![self.identifier()?];
            while self.rest().starts_with('.') {
                self.pos += 1;
                path.push(self.identifier()?);
            }
            path.join(".")
        };
        (!key.is_empty() && !key.starts_with('$')).then_some(key)
    }

    fn direction(&mut self) -> Option<Bson> {
        self.skip_ws();
        if self.rest().starts_with(['"', '\'']) {
            let name = self.string()?;
            return STRING_DIRECTIONS.contains(&name.as_str()).then_some(Bson::String(name));
        }
        if self.eat("-1") {
            return Some(Bson::Int32(-1));
        }
        if self.eat("1") {
            return Some(Bson::Int32(1));
        }
        None
    }

    /// Double-quoted JSON string or single-quoted string without escapes.
    fn string(&mut self) -> Option<String> {
        self.skip_ws();
        let rest = self.rest();
        let quote = rest.chars().next()?;
        match quote {
            '"' => {
                let mut escaped = false;
                let end = rest[1..].char_indices().find_map(|(i, c)| {
                    if escaped {
                        escaped = false;
                        None
                    } else if c == '\\' {
                        escaped = true;
                        None
                    } else if c == '"' {
                        Some(i + 2)
                    } else {
                        None
                    }
                })?;
                let value: String = serde_json::from_str(&rest[..end]).ok()?;
                self.pos += end;
                Some(value)
            }
            '\'' => {
                let end = rest[1..].find('\'')? + 1;
                let value = &rest[1..end];
                if value.contains('\\') {
                    return None;
                }
                self.pos += end + 1;
                Some(value.to_string())
            }
            _ => None,
        }
    }
}

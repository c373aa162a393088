// String-literal table
//
// Float and string literal lexemes are stored once in a flat buffer; the
// symbol entry of the literal constant records the buffer offset.

use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Default)]
pub struct StringTable {
    buffer: String,
    offsets: FxHashMap<String, usize>,
    order: Vec<usize>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of `text` in the buffer, inserting it on first sight
    pub fn insert(&mut self, text: &str) -> usize {
        if let Some(&offset) = self.offsets.get(text) {
            return offset;
        }
        let offset = self.buffer.len();
        self.buffer.push_str(text);
        self.buffer.push('\0');
        self.offsets.insert(text.to_string(), offset);
        self.order.push(offset);
        offset
    }

    /// The string stored at `offset`
    pub fn get(&self, offset: usize) -> Option<&str> {
        let rest = self.buffer.get(offset..)?;
        rest.split('\0').next()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Display for StringTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "STR:cnt={}", self.len())?;
        for &offset in &self.order {
            writeln!(f, "{:6}: {:?}", offset, self.get(offset).unwrap_or_default())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_deduplicates() {
        let mut strings = StringTable::new();
        let a = strings.insert("hello");
        let b = strings.insert("3.14");
        let c = strings.insert("hello");

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings.get(b), Some("3.14"));
    }

    #[test]
    fn test_dump_lists_in_insertion_order() {
        let mut strings = StringTable::new();
        strings.insert("b");
        strings.insert("a");
        assert_eq!(strings.to_string(), "STR:cnt=2\n     0: \"b\"\n     2: \"a\"\n");
    }
}

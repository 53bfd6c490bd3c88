use crate::error::{Error, Result};
use crate::tag::Tag;
use crate::tlv::Tlv;

/// Cursor over the elements of a constructed value.
///
/// OPTIONAL fields are consumed with `read_optional`, which only advances
/// when the next element carries the expected tag.
#[derive(Debug, Clone)]
pub struct SequenceReader<'a> {
    items: &'a [Tlv],
    position: usize,
    context: &'static str,
}

impl<'a> SequenceReader<'a> {
    pub fn new(items: &'a [Tlv], context: &'static str) -> Self {
        SequenceReader {
            items,
            position: 0,
            context,
        }
    }

    pub fn peek_tag(&self) -> Option<Tag> {
        self.items.get(self.position).map(Tlv::tag)
    }

    pub fn read(&mut self) -> Result<&'a Tlv> {
        let item = self
            .items
            .get(self.position)
            .ok_or(Error::MissingElement(self.context))?;
        self.position += 1;
        Ok(item)
    }

    pub fn read_optional(&mut self, tag: Tag) -> Option<&'a Tlv> {
        if self.peek_tag() == Some(tag) {
            self.position += 1;
            return self.items.get(self.position - 1);
        }
        None
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.position
    }

    /// Fails when elements are left unread.
    pub fn finish(self) -> Result<()> {
        if self.remaining() != 0 {
            return Err(Error::TrailingElements(self.context));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::tag::Tag;
    use crate::tlv::Tlv;

    #[test]
    fn test_optional_fields() {
        let seq = Tlv::sequence(vec![
            Tlv::small_integer(1),
            Tlv::explicit(1, Tlv::null()),
            Tlv::octet_string(b"x"),
        ]);
        let mut reader = seq.sequence_reader("test").unwrap();
        assert_eq!(1, reader.read().unwrap().as_u64().unwrap());
        assert!(reader.read_optional(Tag::context(0, true)).is_none());
        assert!(reader.read_optional(Tag::context(1, true)).is_some());
        assert_eq!(b"x".to_vec(), reader.read().unwrap().as_octet_string().unwrap());
        assert!(reader.finish().is_ok());
    }

    #[test]
    fn test_missing_and_trailing() {
        let seq = Tlv::sequence(vec![Tlv::null(), Tlv::null()]);
        let mut reader = seq.sequence_reader("pair").unwrap();
        reader.read().unwrap();
        assert!(matches!(
            reader.clone().finish(),
            Err(Error::TrailingElements("pair"))
        ));
        reader.read().unwrap();
        assert!(matches!(reader.read(), Err(Error::MissingElement("pair"))));
    }
}

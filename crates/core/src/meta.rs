// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! META field lookup, rewritten from `gbGetItemMeta`.

use store::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    Size,
    Encoding,
    Access,
    Created,
    Ttl,
    Left,
    Lock,
}

pub fn parse_meta_field(name: &[u8]) -> Option<MetaField> {
    match name {
        b"size" => Some(MetaField::Size),
        b"encoding" => Some(MetaField::Encoding),
        b"access" => Some(MetaField::Access),
        b"created" => Some(MetaField::Created),
        b"ttl" => Some(MetaField::Ttl),
        b"left" => Some(MetaField::Left),
        b"lock" => Some(MetaField::Lock),
        _ => None,
    }
}

pub fn meta_value(item: &Item, field: MetaField, now: i64) -> i64 {
    match field {
        MetaField::Size => item.size() as i64,
        MetaField::Encoding => item.encoding() as i64,
        MetaField::Access => item.last_access_time(),
        MetaField::Created => item.created_time(),
        MetaField::Ttl => item.ttl(),
        MetaField::Left => item.ttl_remaining(now),
        MetaField::Lock => item.lock(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::ItemData;

    #[test]
    fn unknown_field_is_none() {
        assert_eq!(parse_meta_field(b"bogus"), None);
    }

    #[test]
    fn left_uses_ttl_remaining() {
        let mut item = Item::new(ItemData::Plain(b"v".to_vec().into_boxed_slice()), 100);
        item.set_ttl(50);
        assert_eq!(meta_value(&item, MetaField::Left, 130), 20);
    }
}

// src/codec/rlp.rs
//
// Minimal recursive-length-prefix encoder. Only encoding is implemented; the
// operator never decodes hub payloads.

/// A value encodable as a length-prefixed byte string or nested list.
#[derive(Debug, Clone, PartialEq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(data.into())
    }

    pub fn list(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }
}

impl From<&str> for RlpItem {
    fn from(s: &str) -> Self {
        RlpItem::Bytes(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for RlpItem {
    fn from(b: Vec<u8>) -> Self {
        RlpItem::Bytes(b)
    }
}

/// Canonical encoding of one item.
pub fn encode(item: &RlpItem) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

fn encode_into(item: &RlpItem, out: &mut Vec<u8>) {
    match item {
        RlpItem::Bytes(data) => {
            // A lone byte below 0x80 is its own encoding.
            if data.len() == 1 && data[0] < 0x80 {
                out.push(data[0]);
            } else {
                encode_length(data.len(), 0x80, out);
                out.extend_from_slice(data);
            }
        }
        RlpItem::List(items) => {
            let mut payload = Vec::new();
            for child in items {
                encode_into(child, &mut payload);
            }
            encode_length(payload.len(), 0xc0, out);
            out.extend_from_slice(&payload);
        }
    }
}

fn encode_length(len: usize, offset: u8, out: &mut Vec<u8>) {
    if len <= 55 {
        out.push(offset + len as u8);
    } else {
        let be = len.to_be_bytes();
        let first = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
        let len_bytes = &be[first..];
        out.push(offset + 55 + len_bytes.len() as u8);
        out.extend_from_slice(len_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert_eq!(encode(&RlpItem::bytes(vec![])), vec![0x80]);
        assert_eq!(encode(&RlpItem::list(vec![])), vec![0xc0]);
    }

    #[test]
    fn test_single_bytes() {
        assert_eq!(encode(&RlpItem::bytes(vec![0x00])), vec![0x00]);
        assert_eq!(encode(&RlpItem::bytes(vec![0x7f])), vec![0x7f]);
        // 0x80 and above need a length prefix
        assert_eq!(encode(&RlpItem::bytes(vec![0x80])), vec![0x81, 0x80]);
        assert_eq!(encode(&RlpItem::bytes(vec![0xf8])), vec![0x81, 0xf8]);
    }

    #[test]
    fn test_short_string() {
        // Classic vector: "dog" -> 0x83 'd' 'o' 'g'
        assert_eq!(encode(&"dog".into()), vec![0x83, b'd', b'o', b'g']);
    }

    #[test]
    fn test_long_string() {
        let data = vec![0xaa; 56];
        let encoded = encode(&RlpItem::bytes(data.clone()));
        assert_eq!(encoded[0], 0xb8);
        assert_eq!(encoded[1], 56);
        assert_eq!(&encoded[2..], &data[..]);
    }

    #[test]
    fn test_nested_list() {
        // ["cat", "dog"] -> c8 83 'c' 'a' 't' 83 'd' 'o' 'g'
        let item = RlpItem::list(vec!["cat".into(), "dog".into()]);
        assert_eq!(
            encode(&item),
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
        // [[]] -> c1 c0
        let nested = RlpItem::list(vec![RlpItem::list(vec![])]);
        assert_eq!(encode(&nested), vec![0xc1, 0xc0]);
    }

    #[test]
    fn test_long_list() {
        let items: Vec<RlpItem> = (0..60).map(|_| RlpItem::bytes(vec![0x01])).collect();
        let encoded = encode(&RlpItem::list(items));
        assert_eq!(encoded[0], 0xf8);
        assert_eq!(encoded[1], 60);
        assert_eq!(encoded.len(), 62);
    }
}

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Malformed or unencodable payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CodecError(String);

impl CodecError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self(e.to_string())
    }
}

impl From<std::str::Utf8Error> for CodecError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self(e.to_string())
    }
}

/// Encode/decode pair for one key or value type.
///
/// `encode` returning `None` is the null marker: the record half is absent
/// at the byte level. `decode` receives the absence flag separately from the
/// bytes, so an empty payload and a missing payload stay distinguishable.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Option<Vec<u8>>, CodecError>;

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<T, CodecError>;
}

impl<T, C: Codec<T> + ?Sized> Codec<T> for Arc<C> {
    fn encode(&self, value: &T) -> Result<Option<Vec<u8>>, CodecError> {
        (**self).encode(value)
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<T, CodecError> {
        (**self).decode(bytes, is_absent)
    }
}

fn present<'a>(bytes: &'a [u8], is_absent: bool, what: &str) -> Result<&'a [u8], CodecError> {
    if is_absent {
        Err(CodecError::new(format!("{what}: payload is absent")))
    } else {
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// FnCodec: codec from two function values
// ---------------------------------------------------------------------------

type EncodeFn<T> = dyn Fn(&T) -> Result<Option<Vec<u8>>, CodecError> + Send + Sync;
type DecodeFn<T> = dyn Fn(&[u8], bool) -> Result<T, CodecError> + Send + Sync;

/// Codec assembled from an encode closure and a decode closure.
pub struct FnCodec<T> {
    encode: Box<EncodeFn<T>>,
    decode: Box<DecodeFn<T>>,
}

impl<T> FnCodec<T> {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<Option<Vec<u8>>, CodecError> + Send + Sync + 'static,
        D: Fn(&[u8], bool) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        Self {
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }
}

impl<T> Codec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> Result<Option<Vec<u8>>, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<T, CodecError> {
        (self.decode)(bytes, is_absent)
    }
}

// ---------------------------------------------------------------------------
// Primitive codecs
// ---------------------------------------------------------------------------

/// Identity codec for opaque identifiers: a UUID is its 16 raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdCodec;

impl Codec<Uuid> for IdCodec {
    fn encode(&self, value: &Uuid) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(Some(value.as_bytes().to_vec()))
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<Uuid, CodecError> {
        let bytes = present(bytes, is_absent, "id")?;
        Uuid::from_slice(bytes)
            .map_err(|_| CodecError::new(format!("id: expected 16 bytes, got {}", bytes.len())))
    }
}

/// Big-endian `i32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int32Codec;

impl Codec<i32> for Int32Codec {
    fn encode(&self, value: &i32) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(Some(value.to_be_bytes().to_vec()))
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<i32, CodecError> {
        let bytes = present(bytes, is_absent, "int32")?;
        let raw: [u8; 4] = bytes
            .try_into()
            .map_err(|_| CodecError::new(format!("int32: expected 4 bytes, got {}", bytes.len())))?;
        Ok(i32::from_be_bytes(raw))
    }
}

/// Big-endian `i64`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Int64Codec;

impl Codec<i64> for Int64Codec {
    fn encode(&self, value: &i64) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(Some(value.to_be_bytes().to_vec()))
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<i64, CodecError> {
        let bytes = present(bytes, is_absent, "int64")?;
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| CodecError::new(format!("int64: expected 8 bytes, got {}", bytes.len())))?;
        Ok(i64::from_be_bytes(raw))
    }
}

/// UTF-8 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn encode(&self, value: &String) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(Some(value.as_bytes().to_vec()))
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<String, CodecError> {
        let bytes = present(bytes, is_absent, "string")?;
        Ok(std::str::from_utf8(bytes)?.to_string())
    }
}

/// Raw bytes, passed through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, value: &Vec<u8>) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(Some(value.clone()))
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<Vec<u8>, CodecError> {
        Ok(present(bytes, is_absent, "bytes")?.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Nullable: absence-aware wrapper
// ---------------------------------------------------------------------------

/// Codec for `Option<T>` on top of a codec for `T`.
///
/// `None` is written as the null marker, never as a nested encoding, and an
/// absent payload decodes to `None` without touching the inner codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct Nullable<C>(pub C);

impl<T, C: Codec<T>> Codec<Option<T>> for Nullable<C> {
    fn encode(&self, value: &Option<T>) -> Result<Option<Vec<u8>>, CodecError> {
        match value {
            Some(inner) => self.0.encode(inner),
            None => Ok(None),
        }
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<Option<T>, CodecError> {
        if is_absent {
            Ok(None)
        } else {
            self.0.decode(bytes, false).map(Some)
        }
    }
}

// ---------------------------------------------------------------------------
// JsonCodec: structured messages
// ---------------------------------------------------------------------------

/// serde_json codec for structured message types.
///
/// The caller supplies the value an absent payload decodes to; there is no
/// implicit "empty instance" of `T`.
pub struct JsonCodec<T> {
    default: fn() -> T,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new(default: fn() -> T) -> Self {
        Self {
            default,
            _marker: PhantomData,
        }
    }
}

impl<T: Default> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new(T::default)
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec<T> {
    fn encode(&self, value: &T) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(Some(serde_json::to_vec(value)?))
    }

    fn decode(&self, bytes: &[u8], is_absent: bool) -> Result<T, CodecError> {
        if is_absent {
            return Ok((self.default)());
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_codec_is_identity_over_raw_bytes() {
        let id = Uuid::from_u128(0x0102_0304_0506_0708_090a_0b0c_0d0e_0f10);
        let bytes = IdCodec.encode(&id).unwrap().unwrap();
        assert_eq!(bytes, id.as_bytes().to_vec());
        assert_eq!(IdCodec.decode(&bytes, false).unwrap(), id);
    }

    #[test]
    fn id_codec_rejects_short_and_absent_input() {
        assert!(IdCodec.decode(&[1, 2, 3], false).is_err());
        assert!(IdCodec.decode(&[], true).is_err());
    }

    #[test]
    fn int32_is_big_endian() {
        assert_eq!(Int32Codec.encode(&10).unwrap(), Some(vec![0, 0, 0, 10]));
        assert_eq!(Int32Codec.decode(&[0, 0, 1, 0], false).unwrap(), 256);
        let err = Int32Codec.decode(&[0, 0, 1], false).unwrap_err();
        assert_eq!(err.message(), "int32: expected 4 bytes, got 3");
    }

    #[test]
    fn int64_is_big_endian() {
        assert_eq!(Int64Codec.encode(&-2).unwrap(), Some(vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]));
        assert_eq!(Int64Codec.decode(&[0, 0, 0, 1, 0, 0, 0, 0], false).unwrap(), 1 << 32);
        let err = Int64Codec.decode(&[0, 0, 0, 1], false).unwrap_err();
        assert_eq!(err.message(), "int64: expected 8 bytes, got 4");
    }

    #[test]
    fn bytes_codec_passes_payload_through() {
        let payload = vec![0, 0xff, 7];
        assert_eq!(BytesCodec.encode(&payload).unwrap(), Some(payload.clone()));
        assert_eq!(BytesCodec.decode(&payload, false).unwrap(), payload);
        assert_eq!(BytesCodec.decode(b"", false).unwrap(), Vec::<u8>::new());
        let err = BytesCodec.decode(b"", true).unwrap_err();
        assert_eq!(err.message(), "bytes: payload is absent");
    }

    #[test]
    fn string_codec_rejects_invalid_utf8() {
        assert!(StringCodec.decode(&[0xff, 0xfe], false).is_err());
        assert_eq!(StringCodec.decode(b"", false).unwrap(), "");
    }

    #[test]
    fn nullable_writes_null_marker_for_none() {
        let codec = Nullable(Int32Codec);
        assert_eq!(codec.encode(&None).unwrap(), None);
        assert_eq!(codec.encode(&Some(1)).unwrap(), Some(vec![0, 0, 0, 1]));
    }

    #[test]
    fn nullable_decodes_absence_without_inner_codec() {
        let codec = Nullable(Int32Codec);
        // Bytes would be malformed for Int32Codec; absence wins.
        assert_eq!(codec.decode(&[9], true).unwrap(), None);
        assert_eq!(codec.decode(&[0, 0, 0, 2], false).unwrap(), Some(2));
    }

    #[test]
    fn nullable_keeps_empty_string_distinct_from_absent() {
        let codec = Nullable(StringCodec);
        assert_eq!(codec.encode(&Some(String::new())).unwrap(), Some(Vec::new()));
        assert_eq!(codec.decode(&[], false).unwrap(), Some(String::new()));
        assert_eq!(codec.decode(&[], true).unwrap(), None);
    }

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Order {
        sku: String,
        qty: u32,
    }

    fn empty_order() -> Order {
        Order {
            sku: "none".into(),
            qty: 0,
        }
    }

    #[test]
    fn json_codec_uses_factory_for_absent_payload() {
        let codec = JsonCodec::new(empty_order);
        assert_eq!(codec.decode(&[], true).unwrap(), empty_order());

        let order = Order {
            sku: "A-1".into(),
            qty: 3,
        };
        let bytes = codec.encode(&order).unwrap().unwrap();
        assert_eq!(codec.decode(&bytes, false).unwrap(), order);
        assert!(codec.decode(b"{not json", false).is_err());
    }

    #[test]
    fn fn_codec_delegates_to_closures() {
        let codec = FnCodec::new(
            |v: &bool| Ok(Some(vec![u8::from(*v)])),
            |bytes: &[u8], _absent| match bytes {
                [0] => Ok(false),
                [1] => Ok(true),
                _ => Err(CodecError::new("bad flag")),
            },
        );
        assert_eq!(codec.encode(&true).unwrap(), Some(vec![1]));
        assert!(!codec.decode(&[0], false).unwrap());
        assert!(codec.decode(&[7], false).is_err());
    }
}

//! BinPack: a self-describing tagged binary format for dynamic values.
//!
//! Every value is `TAG[1] | payload`.  Fixed-width numbers are little-endian.
//! Bytes, strings, lists and maps carry a `len:u32le` prefix (for maps, the
//! number of pairs) and maps are stored as alternating key/value in order.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

// ─── Tags ─────────────────────────────────────────────────────────────────────

pub mod tag {
    pub const NULL: u8 = 0;
    pub const TRUE: u8 = 1;
    pub const FALSE: u8 = 2;
    pub const BYTES: u8 = 3;
    pub const STRING: u8 = 4;
    pub const LIST: u8 = 5;
    pub const MAP: u8 = 6;
    pub const DOUBLE: u8 = 7;
    pub const FLOAT: u8 = 8;
    pub const INT8: u8 = 10;
    pub const INT16: u8 = 11;
    pub const INT32: u8 = 12;
    pub const INT64: u8 = 13;
    pub const UINT8: u8 = 14;
    pub const UINT16: u8 = 15;
    pub const UINT32: u8 = 16;
    pub const UINT64: u8 = 17;
}

/// Nesting limit while decoding; keeps hostile input from exhausting the stack.
pub const MAX_DEPTH: usize = 64;

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BinPackError {
    #[error("unknown type tag {0}")]
    UnknownTypeTag(u8),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
    #[error("collection of {0} entries does not fit a u32 length")]
    LengthOverflow(usize),
    #[error("nesting deeper than 64 levels")]
    DepthExceeded,
}

// ─── Value ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<Value>),
    /// Ordered key/value pairs; order survives a round trip.
    Map(Vec<(Value, Value)>),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

// ─── Encoding ─────────────────────────────────────────────────────────────────

pub fn encode(value: &Value) -> Result<Vec<u8>, BinPackError> {
    let mut out = Vec::new();
    encode_into(value, &mut out)?;
    Ok(out)
}

fn write_len(len: usize, out: &mut Vec<u8>) -> Result<(), BinPackError> {
    let len32 = u32::try_from(len).map_err(|_| BinPackError::LengthOverflow(len))?;
    out.extend_from_slice(&len32.to_le_bytes());
    Ok(())
}

pub fn encode_into(value: &Value, out: &mut Vec<u8>) -> Result<(), BinPackError> {
    match value {
        Value::Null => out.push(tag::NULL),
        Value::Bool(true) => out.push(tag::TRUE),
        Value::Bool(false) => out.push(tag::FALSE),
        Value::Bytes(b) => {
            out.push(tag::BYTES);
            write_len(b.len(), out)?;
            out.extend_from_slice(b);
        }
        Value::String(s) => {
            out.push(tag::STRING);
            write_len(s.len(), out)?;
            out.extend_from_slice(s.as_bytes());
        }
        Value::List(items) => {
            out.push(tag::LIST);
            write_len(items.len(), out)?;
            for item in items {
                encode_into(item, out)?;
            }
        }
        Value::Map(pairs) => {
            out.push(tag::MAP);
            write_len(pairs.len(), out)?;
            for (k, v) in pairs {
                encode_into(k, out)?;
                encode_into(v, out)?;
            }
        }
        Value::Float64(v) => {
            out.push(tag::DOUBLE);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::Float32(v) => {
            out.push(tag::FLOAT);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::Int8(v) => {
            out.push(tag::INT8);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::Int16(v) => {
            out.push(tag::INT16);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::Int32(v) => {
            out.push(tag::INT32);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::Int64(v) => {
            out.push(tag::INT64);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::UInt8(v) => {
            out.push(tag::UINT8);
            out.push(*v);
        }
        Value::UInt16(v) => {
            out.push(tag::UINT16);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::UInt32(v) => {
            out.push(tag::UINT32);
            out.extend_from_slice(&v.to_le_bytes());
        }
        Value::UInt64(v) => {
            out.push(tag::UINT64);
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    Ok(())
}

// ─── Decoding ─────────────────────────────────────────────────────────────────

/// Decode exactly one value spanning the whole buffer.
pub fn decode(bytes: &[u8]) -> Result<Value, BinPackError> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode_value()?;
    match decoder.remaining() {
        0 => Ok(value),
        n => Err(BinPackError::TrailingBytes(n)),
    }
}

/// Streaming decoder over a byte slice; values may be read back to back.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, depth: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BinPackError> {
        if self.remaining() < n {
            return Err(BinPackError::UnexpectedEnd);
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], BinPackError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a length prefix, rejecting counts the rest of the buffer cannot
    /// possibly hold (`min_entry` bytes per entry).
    fn read_len(&mut self, min_entry: usize) -> Result<usize, BinPackError> {
        let len = u32::from_le_bytes(self.take_array()?) as usize;
        if len.saturating_mul(min_entry) > self.remaining() {
            return Err(BinPackError::UnexpectedEnd);
        }
        Ok(len)
    }

    pub fn decode_value(&mut self) -> Result<Value, BinPackError> {
        let [t] = self.take_array::<1>()?;
        let value = match t {
            tag::NULL => Value::Null,
            tag::TRUE => Value::Bool(true),
            tag::FALSE => Value::Bool(false),
            tag::BYTES => {
                let len = self.read_len(1)?;
                Value::Bytes(self.take(len)?.to_vec())
            }
            tag::STRING => {
                let len = self.read_len(1)?;
                let s = std::str::from_utf8(self.take(len)?).map_err(|_| BinPackError::InvalidUtf8)?;
                Value::String(s.to_string())
            }
            tag::LIST => {
                let len = self.read_len(1)?;
                self.enter()?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.decode_value()?);
                }
                self.depth -= 1;
                Value::List(items)
            }
            tag::MAP => {
                let len = self.read_len(2)?;
                self.enter()?;
                let mut pairs = Vec::with_capacity(len);
                for _ in 0..len {
                    let k = self.decode_value()?;
                    let v = self.decode_value()?;
                    pairs.push((k, v));
                }
                self.depth -= 1;
                Value::Map(pairs)
            }
            tag::DOUBLE => Value::Float64(f64::from_le_bytes(self.take_array()?)),
            tag::FLOAT => Value::Float32(f32::from_le_bytes(self.take_array()?)),
            tag::INT8 => Value::Int8(i8::from_le_bytes(self.take_array()?)),
            tag::INT16 => Value::Int16(i16::from_le_bytes(self.take_array()?)),
            tag::INT32 => Value::Int32(i32::from_le_bytes(self.take_array()?)),
            tag::INT64 => Value::Int64(i64::from_le_bytes(self.take_array()?)),
            tag::UINT8 => Value::UInt8(u8::from_le_bytes(self.take_array()?)),
            tag::UINT16 => Value::UInt16(u16::from_le_bytes(self.take_array()?)),
            tag::UINT32 => Value::UInt32(u32::from_le_bytes(self.take_array()?)),
            tag::UINT64 => Value::UInt64(u64::from_le_bytes(self.take_array()?)),
            other => return Err(BinPackError::UnknownTypeTag(other)),
        };
        Ok(value)
    }

    fn enter(&mut self) -> Result<(), BinPackError> {
        if self.depth >= MAX_DEPTH {
            return Err(BinPackError::DepthExceeded);
        }
        self.depth += 1;
        Ok(())
    }
}

// ─── JSON bridge ──────────────────────────────────────────────────────────────

impl Value {
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    Value::Float64(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (Value::String(k.clone()), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Bytes become standard base64 strings; non-finite floats become null;
    /// non-string map keys use their JSON text.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Bytes(b) => J::String(STANDARD.encode(b)),
            Value::String(s) => J::String(s.clone()),
            Value::List(items) => J::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(pairs) => J::Object(
                pairs
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Value::String(s) => s.clone(),
                            other => other.to_json().to_string(),
                        };
                        (key, v.to_json())
                    })
                    .collect(),
            ),
            Value::Int8(v) => J::from(*v),
            Value::Int16(v) => J::from(*v),
            Value::Int32(v) => J::from(*v),
            Value::Int64(v) => J::from(*v),
            Value::UInt8(v) => J::from(*v),
            Value::UInt16(v) => J::from(*v),
            Value::UInt32(v) => J::from(*v),
            Value::UInt64(v) => J::from(*v),
            Value::Float32(v) => serde_json::Number::from_f64(f64::from(*v)).map_or(J::Null, J::Number),
            Value::Float64(v) => serde_json::Number::from_f64(*v).map_or(J::Null, J::Number),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

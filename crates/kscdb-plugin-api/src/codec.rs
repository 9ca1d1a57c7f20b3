//! Binary codec for [`RemoteInvocationRequest`].
//!
//! Little-endian, no padding, no version byte:
//!
//! ```text
//! id:u32 | nameLen:u16 | name | funcLen:u16 | func
//!        | paramCount:u16 | (paramLen:u16 | param)* | responseIsJSON:u8
//! ```
//!
//! Strings are UTF-8. The boolean byte must be `0` or `1`. A zero-length
//! input decodes to the default request; any other input must be consumed
//! exactly.

use bytes::BufMut;
use kscdb_constants::plugin::MAX_WIRE_PARAMS;
use kscdb_constants::plugin::MAX_WIRE_STRING_LEN;
use serde::Deserialize;
use serde::Serialize;

use crate::error::CodecError;
use crate::error::FieldTooLongSnafu;
use crate::error::MalformedInputSnafu;

/// A request to run `function` of `capability` with string parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteInvocationRequest {
    /// Caller-chosen correlation id.
    pub id: u32,
    pub capability: String,
    pub function: String,
    pub params: Vec<String>,
    /// Whether the caller wants the response rendered as JSON.
    pub response_is_json: bool,
}

impl RemoteInvocationRequest {
    pub fn new(capability: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            function: function.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_json_response(mut self, response_is_json: bool) -> Self {
        self.response_is_json = response_is_json;
        self
    }

    /// Exact size of the encoded form.
    pub fn encoded_len(&self) -> usize {
        let params: usize = self.params.iter().map(|p| 2 + p.len()).sum();
        4 + 2 + self.capability.len() + 2 + self.function.len() + 2 + params + 1
    }

    /// Encode into the wire layout.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        if self.params.len() > MAX_WIRE_PARAMS {
            return FieldTooLongSnafu {
                field: "params",
                len: self.params.len(),
                max: MAX_WIRE_PARAMS,
            }
            .fail();
        }

        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.put_u32_le(self.id);
        put_string(&mut buf, "capability", &self.capability)?;
        put_string(&mut buf, "function", &self.function)?;
        buf.put_u16_le(self.params.len() as u16);
        for (i, param) in self.params.iter().enumerate() {
            put_string(&mut buf, &format!("params[{i}]"), param)?;
        }
        buf.put_u8(u8::from(self.response_is_json));
        Ok(buf)
    }

    /// Decode from the wire layout.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.is_empty() {
            return Ok(Self::default());
        }

        let mut reader = WireReader::new(data);
        let id = reader.u32("id")?;
        let capability = reader.string("capability")?;
        let function = reader.string("function")?;
        let count = reader.u16("param count")? as usize;
        // Each parameter needs at least its length prefix.
        if reader.remaining() < count.saturating_mul(2) {
            return MalformedInputSnafu {
                field: "params",
                reason: format!("{count} parameters declared, {} bytes left", reader.remaining()),
            }
            .fail();
        }
        let mut params = Vec::with_capacity(count);
        for i in 0..count {
            params.push(reader.string(&format!("params[{i}]"))?);
        }
        let response_is_json = match reader.u8("response_is_json")? {
            0 => false,
            1 => true,
            other => {
                return MalformedInputSnafu {
                    field: "response_is_json",
                    reason: format!("invalid boolean byte {other:#04x}"),
                }
                .fail();
            }
        };
        reader.finish()?;

        Ok(Self {
            id,
            capability,
            function,
            params,
            response_is_json,
        })
    }
}

fn put_string(buf: &mut Vec<u8>, field: &str, value: &str) -> Result<(), CodecError> {
    if value.len() > MAX_WIRE_STRING_LEN {
        return FieldTooLongSnafu {
            field,
            len: value.len(),
            max: MAX_WIRE_STRING_LEN,
        }
        .fail();
    }
    buf.put_u16_le(value.len() as u16);
    buf.put_slice(value.as_bytes());
    Ok(())
}

/// Bounds-checked cursor over an input buffer.
struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return MalformedInputSnafu {
                field,
                reason: format!("truncated: need {len} bytes at offset {}, have {}", self.pos, self.remaining()),
            }
            .fail();
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, field: &str) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn u8(&mut self, field: &str) -> Result<u8, CodecError> {
        Ok(self.array::<1>(field)?[0])
    }

    fn u16(&mut self, field: &str) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.array(field)?))
    }

    fn u32(&mut self, field: &str) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.array(field)?))
    }

    fn string(&mut self, field: &str) -> Result<String, CodecError> {
        let len = self.u16(field)? as usize;
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| {
            MalformedInputSnafu {
                field,
                reason: format!("invalid UTF-8: {}", e.utf8_error()),
            }
            .build()
        })
    }

    fn finish(self) -> Result<(), CodecError> {
        if self.remaining() != 0 {
            return MalformedInputSnafu {
                field: "end",
                reason: format!("{} trailing bytes", self.remaining()),
            }
            .fail();
        }
        Ok(())
    }
}

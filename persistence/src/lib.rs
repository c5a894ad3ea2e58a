#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Binary persistence primitives for excavation save files.
//!
//! [`GameDataWriter`] and [`GameDataReader`] wrap any byte stream and expose
//! the fixed-width little-endian primitives, length-prefixed strings, vectors
//! and opaque state blobs that save files are assembled from. Entities that
//! know how to store themselves implement [`Persistable`]. The [`Storage`]
//! trait abstracts where the finished bytes live.

mod storage;

use std::io::{self, Read, Write};
use std::string::FromUtf8Error;

use glam::Vec3;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, DEFAULT_SAVE_FILE_NAME};

/// Longest string, in bytes, a reader accepts before declaring the stream corrupt.
pub const MAX_STRING_BYTES: u32 = 1024 * 1024;

const LENGTH_PREFIX_MAX_BYTES: u32 = 5;

/// Errors raised while encoding or decoding save data.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying stream failed.
    #[error("save stream failed: {0}")]
    Io(#[from] io::Error),
    /// The stream ended before a complete value could be read.
    #[error("save stream ended unexpectedly")]
    Truncated,
    /// A string length prefix used more than five bytes or overflowed.
    #[error("string length prefix is malformed")]
    MalformedLength,
    /// A string exceeded [`MAX_STRING_BYTES`].
    #[error("string of {length} bytes exceeds the 1 MiB limit")]
    StringTooLong {
        /// Length declared by the prefix or found in the value.
        length: u64,
    },
    /// A string payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
    /// A state blob could not be converted to or from its JSON text.
    #[error("state blob could not be converted: {0}")]
    StateBlob(#[from] serde_json::Error),
}

/// Entity that can write itself to and restore itself from a save stream.
pub trait Persistable {
    /// Writes the entity's persistent fields.
    fn save<W: Write>(&self, writer: &mut GameDataWriter<W>) -> Result<(), CodecError>;

    /// Restores the entity's persistent fields in the order [`Persistable::save`] wrote them.
    fn load<R: Read>(&mut self, reader: &mut GameDataReader<R>) -> Result<(), CodecError>;
}

/// Writes save file primitives to a byte stream.
#[derive(Debug)]
pub struct GameDataWriter<W> {
    inner: W,
}

impl<W: Write> GameDataWriter<W> {
    /// Wraps the provided stream.
    #[must_use]
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Releases the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes a little-endian 32-bit signed integer.
    pub fn write_i32(&mut self, value: i32) -> Result<(), CodecError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Writes a little-endian 32-bit float.
    pub fn write_f32(&mut self, value: f32) -> Result<(), CodecError> {
        self.inner.write_all(&value.to_le_bytes())?;
        Ok(())
    }

    /// Writes a single byte.
    pub fn write_u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.inner.write_all(&[value])?;
        Ok(())
    }

    /// Writes the x, y and z components of a vector as consecutive floats.
    pub fn write_vec3(&mut self, value: Vec3) -> Result<(), CodecError> {
        self.write_f32(value.x)?;
        self.write_f32(value.y)?;
        self.write_f32(value.z)
    }

    /// Writes a UTF-8 string preceded by its 7-bit variable-length byte count.
    pub fn write_string(&mut self, value: &str) -> Result<(), CodecError> {
        let length = u32::try_from(value.len())
            .ok()
            .filter(|length| *length <= MAX_STRING_BYTES)
            .ok_or(CodecError::StringTooLong {
                length: value.len() as u64,
            })?;

        let mut remaining = length;
        while remaining >= 0x80 {
            self.write_u8((remaining & 0x7f) as u8 | 0x80)?;
            remaining >>= 7;
        }
        self.write_u8(remaining as u8)?;
        self.inner.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Writes an opaque state value as a JSON string.
    pub fn write_state_blob<T>(&mut self, state: &T) -> Result<(), CodecError>
    where
        T: Serialize + ?Sized,
    {
        let text = serde_json::to_string(state)?;
        self.write_string(&text)
    }
}

/// Reads save file primitives from a byte stream.
#[derive(Debug)]
pub struct GameDataReader<R> {
    inner: R,
}

impl<R: Read> GameDataReader<R> {
    /// Wraps the provided stream.
    #[must_use]
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Releases the underlying stream.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads a little-endian 32-bit signed integer.
    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Reads a little-endian 32-bit float.
    pub fn read_f32(&mut self) -> Result<f32, CodecError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let [value] = self.read_array::<1>()?;
        Ok(value)
    }

    /// Reads three consecutive floats as a vector.
    pub fn read_vec3(&mut self) -> Result<Vec3, CodecError> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(Vec3::new(x, y, z))
    }

    /// Reads a string written by [`GameDataWriter::write_string`].
    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let length = self.read_length_prefix()?;
        if length > MAX_STRING_BYTES {
            return Err(CodecError::StringTooLong {
                length: u64::from(length),
            });
        }

        let mut bytes = vec![0; length as usize];
        self.read_exact(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Reads an opaque state value written by [`GameDataWriter::write_state_blob`].
    pub fn read_state_blob<T>(&mut self) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        let text = self.read_string()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn read_length_prefix(&mut self) -> Result<u32, CodecError> {
        let mut length = 0_u32;
        for index in 0..LENGTH_PREFIX_MAX_BYTES {
            let byte = self.read_u8()?;
            let last = index == LENGTH_PREFIX_MAX_BYTES - 1;
            // only the low four bits of the fifth byte fit in 32 bits
            if last && byte > 0x0f {
                return Err(CodecError::MalformedLength);
            }
            length |= u32::from(byte & 0x7f) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(length);
            }
        }
        Err(CodecError::MalformedLength)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut buffer = [0; N];
        self.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn read_exact(&mut self, buffer: &mut [u8]) -> Result<(), CodecError> {
        self.inner.read_exact(buffer).map_err(|error| {
            if error.kind() == io::ErrorKind::UnexpectedEof {
                CodecError::Truncated
            } else {
                CodecError::Io(error)
            }
        })
    }
}

//! Flat weight files.
//!
//! Layout, little-endian throughout:
//!
//! ```text
//! "OCCW"  u32 version  u8 element tag  u32 entry count
//! per trainable entry, in declaration order:
//!     u32 name length, name bytes (UTF-8)
//!     u64 width, u64 count
//!     width * count raw elements
//! ```
//!
//! Only values are stored. Inputs are skipped and moment estimates start
//! from zero after loading.

use crate::error::{Error, Result};
use crate::tensor::{Element, ParameterSet, Shape};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"OCCW";
const VERSION: u32 = 1;

/// Writes every trainable entry of `params` to `writer`.
pub fn write<T: Element, W: Write>(params: &ParameterSet<T>, mut writer: W) -> Result<()> {
    let entries: Vec<_> = params
        .ids()
        .filter(|&id| params.is_trainable(id))
        .map(|id| params.get(id))
        .collect();

    writer.write_all(MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&[T::TAG])?;
    writer.write_all(&(entries.len() as u32).to_le_bytes())?;

    let mut buffer = Vec::new();
    for tensor in entries {
        let name = tensor.name.as_bytes();
        writer.write_all(&(name.len() as u32).to_le_bytes())?;
        writer.write_all(name)?;
        let shape = tensor.shape();
        writer.write_all(&(shape.width as u64).to_le_bytes())?;
        writer.write_all(&(shape.count as u64).to_le_bytes())?;

        buffer.clear();
        for &value in &tensor.values {
            value.write_le(&mut buffer);
        }
        writer.write_all(&buffer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a weight file into a fresh set of trainable entries.
pub fn read<T: Element, R: Read>(mut reader: R) -> Result<ParameterSet<T>> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::format("bad magic"));
    }
    let version = read_u32(&mut reader)?;
    if version != VERSION {
        return Err(Error::format(format!("unsupported version {}", version)));
    }
    let mut tag = [0u8; 1];
    reader.read_exact(&mut tag)?;
    if tag[0] != T::TAG {
        return Err(Error::format(format!(
            "element tag {} does not match expected {}",
            tag[0],
            T::TAG
        )));
    }

    let count = read_u32(&mut reader)?;
    let mut params = ParameterSet::new();
    for _ in 0..count {
        let name_len = read_u32(&mut reader)? as usize;
        let name = read_bytes(&mut reader, name_len)?;
        let name = String::from_utf8(name).map_err(|_| Error::format("name is not UTF-8"))?;
        let width = read_dimension(&mut reader)?;
        let rows = read_dimension(&mut reader)?;
        let size = width
            .checked_mul(rows)
            .and_then(|len| len.checked_mul(T::BYTES))
            .ok_or_else(|| Error::format(format!("entry '{}' size overflows", name)))?;

        // Allocation is bounded by the bytes actually present.
        let raw = read_bytes(&mut reader, size)?;
        let id = params.add(&name, Shape::new(width, rows))?;
        let tensor = params.get_mut(id);
        for (value, bytes) in tensor.values.iter_mut().zip(raw.chunks_exact(T::BYTES)) {
            *value = T::read_le(bytes);
        }
    }
    Ok(params)
}

fn read_dimension<R: Read>(reader: &mut R) -> Result<usize> {
    let value = read_u64(reader)?;
    match usize::try_from(value) {
        Ok(0) => Err(Error::format("empty dimension")),
        Ok(dim) => Ok(dim),
        Err(_) => Err(Error::format(format!("dimension {} too large", value))),
    }
}

fn read_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated weight file").into());
    }
    Ok(bytes)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Saves the trainable entries of `params` to `path`.
pub fn save<T: Element>(params: &ParameterSet<T>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    write(params, BufWriter::new(File::create(path)?))?;
    info!("weights saved to {}", path.display());
    Ok(())
}

/// Loads a weight file saved by [`save`].
pub fn load<T: Element>(path: impl AsRef<Path>) -> Result<ParameterSet<T>> {
    read(BufReader::new(File::open(path)?))
}

/// Copies the values stored at `path` into matching entries of `params`.
///
/// Every stored entry must exist in `params` with the same shape; otherwise
/// nothing is copied. Entries of `params` missing from the file keep their
/// values. Moments are cleared.
pub fn load_into<T: Element>(params: &mut ParameterSet<T>, path: impl AsRef<Path>) -> Result<()> {
    let stored = load::<T>(path)?;
    let mut targets = Vec::with_capacity(stored.len());
    for tensor in stored.iter() {
        let id = params.id(&tensor.name)?;
        let target = params.get(id);
        if target.shape() != tensor.shape() {
            return Err(Error::shape_mismatch(
                "load_into",
                target.shape(),
                tensor.shape(),
            ));
        }
        targets.push(id);
    }
    for (id, tensor) in targets.into_iter().zip(stored.iter()) {
        params.get_mut(id).values.copy_from_slice(&tensor.values);
    }
    for id in params.ids().filter(|&id| params.is_trainable(id)) {
        let name = &params.get(id).name;
        if stored.id(name).is_err() {
            warn!("'{}' not present in weight file", name);
        }
    }
    params.reset_moments();
    Ok(())
}

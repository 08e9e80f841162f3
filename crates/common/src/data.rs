//! Little-endian primitive (de)serialization helpers shared by the
//! save-state codec of every stateful component.

use std::io::{Cursor, Read, Write};

use crate::error::Error;

#[inline(always)]
pub fn read_u8(data: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    let mut buffer = [0x00; size_of::<u8>()];
    data.read_exact(&mut buffer)?;
    Ok(u8::from_le_bytes(buffer))
}

#[inline(always)]
pub fn read_u16(data: &mut Cursor<&[u8]>) -> Result<u16, Error> {
    let mut buffer = [0x00; size_of::<u16>()];
    data.read_exact(&mut buffer)?;
    Ok(u16::from_le_bytes(buffer))
}

#[inline(always)]
pub fn read_u32(data: &mut Cursor<&[u8]>) -> Result<u32, Error> {
    let mut buffer = [0x00; size_of::<u32>()];
    data.read_exact(&mut buffer)?;
    Ok(u32::from_le_bytes(buffer))
}

#[inline(always)]
pub fn read_i16(data: &mut Cursor<&[u8]>) -> Result<i16, Error> {
    let mut buffer = [0x00; size_of::<i16>()];
    data.read_exact(&mut buffer)?;
    Ok(i16::from_le_bytes(buffer))
}

#[inline(always)]
pub fn read_i32(data: &mut Cursor<&[u8]>) -> Result<i32, Error> {
    let mut buffer = [0x00; size_of::<i32>()];
    data.read_exact(&mut buffer)?;
    Ok(i32::from_le_bytes(buffer))
}

#[inline(always)]
pub fn read_u64(data: &mut Cursor<&[u8]>) -> Result<u64, Error> {
    let mut buffer = [0x00; size_of::<u64>()];
    data.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

/// Reads a `u32`-length-prefixed byte array, as used for variable sized
/// sections of a save state (RAM banks, VRAM, wave RAM, ...).
#[inline(always)]
pub fn read_bytes(data: &mut Cursor<&[u8]>) -> Result<Vec<u8>, Error> {
    let size = read_u32(data)? as usize;
    let mut buffer = vec![0x00; size];
    data.read_exact(&mut buffer)?;
    Ok(buffer)
}

#[inline(always)]
pub fn write_u8(data: &mut Cursor<Vec<u8>>, value: u8) -> Result<(), Error> {
    data.write_all(&value.to_le_bytes())?;
    Ok(())
}

#[inline(always)]
pub fn write_u16(data: &mut Cursor<Vec<u8>>, value: u16) -> Result<(), Error> {
    data.write_all(&value.to_le_bytes())?;
    Ok(())
}

#[inline(always)]
pub fn write_u32(data: &mut Cursor<Vec<u8>>, value: u32) -> Result<(), Error> {
    data.write_all(&value.to_le_bytes())?;
    Ok(())
}

#[inline(always)]
pub fn write_i16(data: &mut Cursor<Vec<u8>>, value: i16) -> Result<(), Error> {
    data.write_all(&value.to_le_bytes())?;
    Ok(())
}

#[inline(always)]
pub fn write_i32(data: &mut Cursor<Vec<u8>>, value: i32) -> Result<(), Error> {
    data.write_all(&value.to_le_bytes())?;
    Ok(())
}

#[inline(always)]
pub fn write_u64(data: &mut Cursor<Vec<u8>>, value: u64) -> Result<(), Error> {
    data.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Writes a byte array prefixed by its `u32` length, as used for variable
/// sized sections of a save state (RAM banks, VRAM, wave RAM, ...).
#[inline(always)]
pub fn write_bytes(data: &mut Cursor<Vec<u8>>, value: &[u8]) -> Result<(), Error> {
    write_u32(data, value.len() as u32)?;
    data.write_all(value)?;
    Ok(())
}

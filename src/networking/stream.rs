/*
    Copyright © 2023, ParallelChain Lab
    Licensed under the Apache License, Version 2.0: http://www.apache.org/licenses/LICENSE-2.0
*/

//! Length-prefixed framing of borsh messages over a byte stream.
//!
//! A frame is the length of the payload as a 4-byte little-endian integer, followed by the borsh
//! encoding of the message.

use std::io::{Read, Write};

use borsh::{BorshDeserialize, BorshSerialize};

use super::network::NetworkError;

/// Upper bound on a frame's payload. A 65536 x 65536 grid encodes to 4 GiB, so this caps grids at
/// roughly 256 MiB of cells per message.
pub(crate) const MAX_FRAME_LEN: u32 = 1 << 28;

pub(crate) fn write_frame<M: BorshSerialize>(stream: &mut impl Write, message: &M) -> Result<(), NetworkError> {
    let payload = message.try_to_vec().map_err(NetworkError::Codec)?;
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|&len| len <= MAX_FRAME_LEN)
        .ok_or(NetworkError::FrameTooLarge { len: u32::MAX })?;

    stream.write_all(&len.to_le_bytes())?;
    stream.write_all(&payload)?;
    stream.flush()?;
    Ok(())
}

pub(crate) fn read_frame<M: BorshDeserialize>(stream: &mut impl Read) -> Result<M, NetworkError> {
    let len = {
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf)?;
        u32::from_le_bytes(buf)
    };
    if len > MAX_FRAME_LEN {
        return Err(NetworkError::FrameTooLarge { len });
    }

    let payload = {
        let mut buf = vec![0u8; len as usize];
        stream.read_exact(&mut buf)?;
        buf
    };

    M::try_from_slice(&payload).map_err(NetworkError::Codec)
}

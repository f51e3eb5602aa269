//! Purpose: Generate random drawing ids, link keys and client correlation ids.
//! Exports: `generate_drawing_id`, `generate_link_key`, `generate_client_id`.
//! Role: Identifier source for the builder; no collision tracking.
//! Invariants: Characters are drawn uniformly from `[A-Za-z0-9]` via rejection sampling.

use crate::core::error::{Error, ErrorKind};
use getrandom::fill as fill_random;

const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
// Largest multiple of 62 that fits in a byte; bytes at or above it are redrawn.
const REJECT_AT: u8 = 248;

pub const DRAWING_ID_LEN: usize = 6;
pub const LINK_KEY_LEN: usize = 15;

pub fn generate_drawing_id() -> Result<String, Error> {
    random_alphanumeric(DRAWING_ID_LEN)
}

pub fn generate_link_key() -> Result<String, Error> {
    random_alphanumeric(LINK_KEY_LEN)
}

/// `<6 chars>/<digit>/<6 chars>`.
pub fn generate_client_id() -> Result<String, Error> {
    let digit = random_below(10)?;
    Ok(format!(
        "{}/{digit}/{}",
        generate_drawing_id()?,
        generate_drawing_id()?
    ))
}

fn random_alphanumeric(len: usize) -> Result<String, Error> {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 32];
    while out.len() < len {
        fill(&mut buf)?;
        for byte in buf {
            if byte >= REJECT_AT {
                continue;
            }
            out.push(ALPHABET[(byte % 62) as usize] as char);
            if out.len() == len {
                break;
            }
        }
    }
    Ok(out)
}

fn random_below(bound: u8) -> Result<u8, Error> {
    let limit = u8::MAX - (u8::MAX % bound);
    let mut byte = [0u8; 1];
    loop {
        fill(&mut byte)?;
        if byte[0] < limit {
            return Ok(byte[0] % bound);
        }
    }
}

fn fill(buf: &mut [u8]) -> Result<(), Error> {
    fill_random(buf).map_err(|err| {
        Error::new(ErrorKind::Internal).with_message(format!("failed to generate random id: {err}"))
    })
}

//! `crypto` namespace. Every transform stores its result as one arena entry;
//! guests pull bytes back out with `get_data_len` / `get_data`.

use aes::{Aes128, Aes192, Aes256};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use digest::Digest;
use md5::Md5;
use mochi_obj_model::{Fault, GuestMemory, Handle};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::env::copy_out;
use crate::error::HostError;
use crate::value::{HostArena, HostValue};

const MAX_GENERATED_LEN: i32 = 1 << 20;
const AES_BLOCK: usize = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashKind {
    pub fn from_code(code: i32) -> Result<Self, Fault> {
        match code {
            0 => Ok(HashKind::Md5),
            1 => Ok(HashKind::Sha1),
            2 => Ok(HashKind::Sha256),
            3 => Ok(HashKind::Sha384),
            4 => Ok(HashKind::Sha512),
            other => Err(Fault::cast(format!("unknown hash algorithm {other}"))),
        }
    }

    fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashKind::Md5 => Md5::digest(data).to_vec(),
            HashKind::Sha1 => Sha1::digest(data).to_vec(),
            HashKind::Sha256 => Sha256::digest(data).to_vec(),
            HashKind::Sha384 => Sha384::digest(data).to_vec(),
            HashKind::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    fn pbkdf2(self, password: &[u8], salt: &[u8], rounds: u32, out: &mut [u8]) {
        match self {
            HashKind::Md5 => pbkdf2::pbkdf2_hmac::<Md5>(password, salt, rounds, out),
            HashKind::Sha1 => pbkdf2::pbkdf2_hmac::<Sha1>(password, salt, rounds, out),
            HashKind::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, rounds, out),
            HashKind::Sha384 => pbkdf2::pbkdf2_hmac::<Sha384>(password, salt, rounds, out),
            HashKind::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, rounds, out),
        }
    }
}

fn bytes_of(arena: &HostArena, handle: Handle) -> Result<Vec<u8>, HostError> {
    Ok(arena.with(handle, |value| value.expect_bytes().map(<[u8]>::to_vec))??)
}

fn generated_len(len: i32, what: &str) -> Result<usize, Fault> {
    if !(1..=MAX_GENERATED_LEN).contains(&len) {
        return Err(Fault::cast(format!(
            "{what} length {len} outside 1..={MAX_GENERATED_LEN}"
        )));
    }
    Ok(len as usize)
}

pub fn get_data_len(arena: &HostArena, handle: Handle) -> Result<i32, HostError> {
    let len = arena.with(handle, |value| value.expect_bytes().map(<[u8]>::len))??;
    Ok(i32::try_from(len).unwrap_or(i32::MAX))
}

pub fn get_data(
    arena: &HostArena,
    memory: &mut GuestMemory<'_>,
    handle: Handle,
    ptr: i32,
    cap: i32,
) -> Result<i32, HostError> {
    let bytes = bytes_of(arena, handle)?;
    copy_out(memory, ptr, cap, &bytes)
}

pub fn base64_encode(arena: &HostArena, data: &[u8]) -> Handle {
    arena.add(HostValue::String(STANDARD.encode(data)))
}

pub fn base64_decode(arena: &HostArena, text: &[u8]) -> Result<Handle, HostError> {
    let bytes = STANDARD.decode(text.trim_ascii())?;
    Ok(arena.add(HostValue::Bytes(bytes)))
}

pub fn utf8_parse(arena: &HostArena, data: &[u8]) -> Result<Handle, HostError> {
    let text = String::from_utf8(data.to_vec())?;
    Ok(arena.add(HostValue::String(text)))
}

pub fn hash(arena: &HostArena, kind: i32, data: &[u8]) -> Result<Handle, HostError> {
    let kind = HashKind::from_code(kind)?;
    Ok(arena.add(HostValue::Bytes(kind.digest(data))))
}

pub fn pbkdf2(
    arena: &HostArena,
    kind: i32,
    password: &[u8],
    salt: &[u8],
    rounds: i32,
    key_len: i32,
) -> Result<Handle, HostError> {
    let kind = HashKind::from_code(kind)?;
    if rounds <= 0 {
        return Err(Fault::cast(format!("pbkdf2 needs a positive round count, got {rounds}")).into());
    }
    let mut key = vec![0u8; generated_len(key_len, "derived key")?];
    kind.pbkdf2(password, salt, rounds as u32, &mut key);
    Ok(arena.add(HostValue::Bytes(key)))
}

pub fn random_bytes(arena: &HostArena, len: i32) -> Result<Handle, HostError> {
    let mut bytes = vec![0u8; generated_len(len, "random")?];
    getrandom::fill(&mut bytes).map_err(|err| Fault::unknown(format!("entropy source failed: {err}")))?;
    Ok(arena.add(HostValue::Bytes(bytes)))
}

fn check_iv(iv: &[u8]) -> Result<(), Fault> {
    if iv.len() != AES_BLOCK {
        return Err(Fault::cast(format!("AES-CBC needs a 16 byte IV, got {}", iv.len())));
    }
    Ok(())
}

fn key_size_fault(len: usize) -> HostError {
    Fault::cast(format!("AES key must be 16, 24 or 32 bytes, got {len}")).into()
}

pub fn aes_encrypt(arena: &HostArena, data: &[u8], key: &[u8], iv: &[u8]) -> Result<Handle, HostError> {
    check_iv(iv)?;
    let sealed = match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| key_size_fault(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        24 => cbc::Encryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|_| key_size_fault(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| key_size_fault(key.len()))?
            .encrypt_padded_vec_mut::<Pkcs7>(data),
        other => return Err(key_size_fault(other)),
    };
    Ok(arena.add(HostValue::Bytes(sealed)))
}

pub fn aes_decrypt(arena: &HostArena, data: &[u8], key: &[u8], iv: &[u8]) -> Result<Handle, HostError> {
    check_iv(iv)?;
    let opened = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| key_size_fault(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        24 => cbc::Decryptor::<Aes192>::new_from_slices(key, iv)
            .map_err(|_| key_size_fault(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| key_size_fault(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        other => return Err(key_size_fault(other)),
    };
    let opened = opened.map_err(|_| HostError::Padding)?;
    Ok(arena.add(HostValue::Bytes(opened)))
}

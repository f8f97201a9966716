//! At-rest protection for deployed definitions.
//!
//! The key comes from the machine name (PBKDF2-HMAC-SHA384, 1000 rounds,
//! empty salt, 16 bytes) and the IV is fixed, so an artifact only opens on
//! the machine it was sealed for. This keeps trainees from reading the
//! answer key; it is not meant to stop a determined attacker.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use sha2::Sha384;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const KDF_ROUNDS: u32 = 1000;

const IV: [u8; 16] = [
    0x48, 0x61, 0x72, 0x64, 0x65, 0x6e, 0x53, 0x63, 0x6f, 0x72, 0x65, 0x2d, 0x49, 0x56, 0x30, 0x31,
];

/// Why a sealed artifact could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("wrong key or corrupt ciphertext")]
    Padding,

    #[error("decrypted bytes are not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Seals and opens definition documents for one machine.
#[derive(Clone)]
pub struct DefinitionCipher {
    key: [u8; 16],
}

impl DefinitionCipher {
    pub fn for_machine(machine_name: &str) -> Self {
        let mut key = [0u8; 16];
        pbkdf2::pbkdf2_hmac::<Sha384>(machine_name.as_bytes(), b"", KDF_ROUNDS, &mut key);
        Self { key }
    }

    /// Encrypt a document and armour it as base64.
    pub fn seal(&self, plaintext: &str) -> String {
        let ciphertext = Aes128CbcEnc::new(&self.key.into(), &IV.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        BASE64.encode(ciphertext)
    }

    /// Reverse [`seal`](Self::seal).
    pub fn open(&self, sealed: &str) -> Result<String, OpenError> {
        let ciphertext = BASE64.decode(sealed.trim())?;
        let plaintext = Aes128CbcDec::new(&self.key.into(), &IV.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| OpenError::Padding)?;
        Ok(String::from_utf8(plaintext)?)
    }
}

impl std::fmt::Debug for DefinitionCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionCipher").finish_non_exhaustive()
    }
}

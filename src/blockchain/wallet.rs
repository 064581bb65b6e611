// src/blockchain/wallet.rs

use std::fmt;

use bip39::{Language, Mnemonic};
use cosmrs::bip32::DerivationPath;
use cosmrs::crypto::secp256k1::SigningKey;
use cosmrs::crypto::PublicKey;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;
use zeroize::Zeroizing;

use crate::blockchain::error::WalletError;
use crate::blockchain::models::WalletResponse;

/// A signing account derived from a mnemonic for the duration of one call.
///
/// Nothing here is cached: every signed operation derives a fresh signer and
/// drops it when the call finishes.
pub struct AccountSigner {
    key: SigningKey,
    address: String,
}

impl fmt::Debug for AccountSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl AccountSigner {
    pub fn from_mnemonic(
        mnemonic: &SecretString,
        prefix: &str,
        hd_path: &str,
    ) -> Result<Self, WalletError> {
        let phrase = Zeroizing::new(normalize_phrase(mnemonic.expose_secret()));
        let parsed = Mnemonic::parse_in_normalized(Language::English, &phrase)
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        let seed = Zeroizing::new(parsed.to_seed(""));
        Self::from_seed(seed.as_slice(), prefix, hd_path)
    }

    fn from_seed(seed: &[u8], prefix: &str, hd_path: &str) -> Result<Self, WalletError> {
        let path: DerivationPath = hd_path
            .parse()
            .map_err(|e| WalletError::Derivation(format!("invalid HD path {}: {}", hd_path, e)))?;
        let key = SigningKey::derive_from_path(seed, &path)
            .map_err(|e| WalletError::Derivation(e.to_string()))?;
        let address = key
            .public_key()
            .account_id(prefix)
            .map_err(|e| WalletError::Derivation(e.to_string()))?
            .to_string();
        Ok(Self { key, address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }
}

/// Collapses whitespace and case so pasted phrases parse.
fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generate a new 24-word wallet and return its first account.
pub fn generate_wallet(prefix: &str, hd_path: &str) -> Result<WalletResponse, WalletError> {
    info!("Generating new wallet");
    let mut entropy = Zeroizing::new([0u8; 32]);
    rand::thread_rng().fill_bytes(&mut entropy[..]);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..])
        .map_err(|e| WalletError::Generation(e.to_string()))?;
    let seed = Zeroizing::new(mnemonic.to_seed(""));
    let signer = AccountSigner::from_seed(seed.as_slice(), prefix, hd_path)?;
    Ok(WalletResponse {
        mnemonic: mnemonic.to_string(),
        address: signer.address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "m/44'/118'/0'/0/0";
    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generated_wallet_has_24_words_and_matching_address() {
        let wallet = generate_wallet("andr", PATH).unwrap();
        assert_eq!(wallet.mnemonic.split_whitespace().count(), 24);
        assert!(wallet.address.starts_with("andr1"));

        let signer =
            AccountSigner::from_mnemonic(&SecretString::new(wallet.mnemonic.clone()), "andr", PATH)
                .unwrap();
        assert_eq!(signer.address(), wallet.address);
    }

    #[test]
    fn derivation_ignores_extra_whitespace_and_case() {
        let a = AccountSigner::from_mnemonic(&SecretString::new(ABANDON.to_string()), "andr", PATH)
            .unwrap();
        let messy = format!("  {}  ", ABANDON.to_uppercase().replace(' ', "   "));
        let b = AccountSigner::from_mnemonic(&SecretString::new(messy), "andr", PATH).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn rejects_invalid_mnemonic() {
        let err = AccountSigner::from_mnemonic(
            &SecretString::new("not a real phrase".to_string()),
            "andr",
            PATH,
        )
        .unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn debug_output_hides_key_material() {
        let signer =
            AccountSigner::from_mnemonic(&SecretString::new(ABANDON.to_string()), "andr", PATH)
                .unwrap();
        let debug = format!("{:?}", signer);
        assert!(debug.contains(signer.address()));
        assert!(!debug.contains("abandon"));
    }
}

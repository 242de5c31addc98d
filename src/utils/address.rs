use solana_sdk::pubkey::Pubkey;

use crate::error::AnalysisError;

const MIN_ADDRESS_LEN: usize = 32;
const MAX_ADDRESS_LEN: usize = 44;

/// Check that `address` looks like a Solana wallet address: 32-44 Base58
/// characters that decode to a 32-byte public key.
pub fn validate_wallet_address(address: &str) -> bool {
    if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&address.len()) {
        return false;
    }

    match bs58::decode(address).into_vec() {
        Ok(bytes) => bytes.len() == 32,
        Err(_) => false,
    }
}

/// Parse a wallet address, rejecting anything `validate_wallet_address` rejects.
pub fn parse_wallet_address(address: &str) -> Result<Pubkey, AnalysisError> {
    if !validate_wallet_address(address) {
        return Err(AnalysisError::InvalidAddress(address.to_string()));
    }

    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|_| AnalysisError::InvalidAddress(address.to_string()))?;
    Pubkey::try_from(bytes.as_slice()).map_err(|_| AnalysisError::InvalidAddress(address.to_string()))
}

pub mod hash;
pub mod jwt;
pub mod url_signer;

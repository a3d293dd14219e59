//! Domain model types shared between the HTTP layer and storage.

pub mod dpp;
pub mod project;
pub mod user;

pub use dpp::{
    BlockchainProof, DigitalProductPassport, DppMetadata, DppStatus, DppSummary, EnrichmentData,
    InstallationData, MaterialCategory, ProcurementData, QuantityUnit, VerificationEvent,
};
pub use project::{
    AuthorizedParty, Budget, Coordinates, Location, Project, ProjectStatus, ProjectSummary,
    ProjectType, Timeline,
};
pub use user::{is_wallet_address, normalize_wallet, Action, Role, User};

use rand::Rng;

/// Four-character uppercase base36 suffix for human-readable IDs
/// (`PRJ-<millis>-K3F9`, `DPP-...`). Uniqueness comes from the
/// millisecond timestamp next to it; the suffix only disambiguates
/// same-millisecond creations.
pub(crate) fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::thread_rng();
    (0..4)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_four_uppercase_base36_chars() {
        for _ in 0..50 {
            let s = random_suffix();
            assert_eq!(s.len(), 4);
            assert!(s.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        }
    }
}

use crate::sbom_generation::domain::{Hash, HashAlgorithm};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_384, Sha3_512};

/// Computes lowercase hex digests of artifact bytes.
pub struct DigestCalculator;

impl DigestCalculator {
    pub fn compute(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
        match algorithm {
            HashAlgorithm::Md5 => hex::encode(Md5::digest(bytes)),
            HashAlgorithm::Sha1 => hex::encode(Sha1::digest(bytes)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
            HashAlgorithm::Sha384 => hex::encode(Sha384::digest(bytes)),
            HashAlgorithm::Sha3_256 => hex::encode(Sha3_256::digest(bytes)),
            HashAlgorithm::Sha3_384 => hex::encode(Sha3_384::digest(bytes)),
            HashAlgorithm::Sha3_512 => hex::encode(Sha3_512::digest(bytes)),
        }
    }

    /// All supported digests, in emission order.
    pub fn compute_all(bytes: &[u8]) -> Vec<Hash> {
        HashAlgorithm::ALL
            .iter()
            .map(|&algorithm| Hash {
                algorithm,
                value: Self::compute(algorithm, bytes),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests_of_abc() {
        assert_eq!(
            DigestCalculator::compute(HashAlgorithm::Md5, b"abc"),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            DigestCalculator::compute(HashAlgorithm::Sha1, b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            DigestCalculator::compute(HashAlgorithm::Sha256, b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            DigestCalculator::compute(HashAlgorithm::Sha3_256, b"abc"),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn test_compute_all_covers_every_algorithm_in_order() {
        let hashes = DigestCalculator::compute_all(b"content");
        let algorithms: Vec<HashAlgorithm> = hashes.iter().map(|h| h.algorithm).collect();
        assert_eq!(algorithms, HashAlgorithm::ALL.to_vec());
        assert!(hashes
            .iter()
            .all(|h| h.value.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))));
        assert_eq!(hashes[3].value.len(), 128);
    }
}

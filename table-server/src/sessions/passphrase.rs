//! Group passphrases
//!
//! Read aloud between guests at a table, so the alphabet leaves out the
//! look-alikes `0 O 1 I`.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Random uppercase passphrase of `length` characters
pub fn generate_passphrase(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Case-insensitive comparison, ignoring surrounding whitespace
pub fn passphrase_matches(expected: &str, presented: &str) -> bool {
    let presented = presented.trim();
    !presented.is_empty() && expected.eq_ignore_ascii_case(presented)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_passphrase_shape() {
        for _ in 0..200 {
            let p = generate_passphrase(6);
            assert_eq!(p.len(), 6);
            assert!(p.bytes().all(|b| ALPHABET.contains(&b)), "{p}");
            assert!(!p.contains(['0', 'O', '1', 'I']));
        }
    }

    #[test]
    fn test_passphrases_differ() {
        let a = generate_passphrase(8);
        let b = generate_passphrase(8);
        assert_ne!(a, b);
    }

    #[test]
    fn test_matching_is_lenient_on_case_and_spaces() {
        assert!(passphrase_matches("K7QX2M", "k7qx2m"));
        assert!(passphrase_matches("K7QX2M", "  K7QX2M\n"));
        assert!(!passphrase_matches("K7QX2M", "K7QX2"));
        assert!(!passphrase_matches("K7QX2M", "   "));
    }
}

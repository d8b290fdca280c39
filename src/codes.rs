//! Room-code and host-key generation.

use rand::Rng;

/// Alphabet for join codes; visually ambiguous characters (O/0, I/1) are
/// excluded so codes survive being read out loud or scribbled on a
/// whiteboard.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Alphabet for host keys.
const HOST_KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a room join code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Length of the host capability secret.
pub const HOST_KEY_LENGTH: usize = 32;

/// Generate a 6-character uppercase join code.
pub fn generate_room_code() -> String {
    random_string(ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH)
}

/// Generate the 32-character secret that authorizes host actions.
pub fn generate_host_key() -> String {
    random_string(HOST_KEY_ALPHABET, HOST_KEY_LENGTH)
}

fn random_string(alphabet: &[u8], length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_codes_use_the_unambiguous_alphabet() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LENGTH);
            assert!(
                code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)),
                "unexpected character in {code}"
            );
            assert!(!code.contains(['O', '0', 'I', '1']));
        }
    }

    #[test]
    fn host_keys_are_long_alphanumerics() {
        let key = generate_host_key();
        assert_eq!(key.len(), HOST_KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

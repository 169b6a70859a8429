//! The bcrypt key derivation itself and the `$2b$` text framing.

use zeroize::{Zeroize, Zeroizing};

use crate::b64;
use crate::blowfish::{stream_to_word, Blowfish};

/// Number of bytes in a salt.
pub const SALT_SIZE: usize = 16;

/// Number of bytes in a derived password hash.
pub const HASH_SIZE: usize = 23;

/// Number of bytes in an encoded bcrypt hash.
pub const ENCODED_SIZE: usize = 60;

/// Minimum work factor.
pub const MIN_COST: u32 = 4;

/// Maximum work factor. A hash at this cost runs 2^31 schedule iterations;
/// the cost is deliberately not capped below it.
pub const MAX_COST: u32 = 31;

/// Work factor used when the caller has no preference.
pub const DEFAULT_COST: u32 = 10;

/// A 16-byte binary salt.
pub type Salt = [u8; SALT_SIZE];

/// The first 23 bytes of the derived block, in binary form. The 24th byte is
/// discarded, preserving the historical bcrypt output width.
pub type PwdHash = [u8; HASH_SIZE];

/// A complete `$2b$CC$...` hash: exactly 60 ASCII bytes, no trailing NUL.
pub type EncodedHash = [u8; ENCODED_SIZE];

// Only the first 72 password bytes take part in the key schedule.
const MAX_PWD_SIZE: usize = 72;

// Three 64-bit blocks of fixed plaintext.
const CTEXT: &[u8; 24] = b"OrpheanBeholderScryDoubt";
const BLOCKS: usize = 6;

// 16 salt bytes span 22 base64 characters, 23 hash bytes span 31.
const ENC_SALT_SIZE: usize = b64::encoded_len(SALT_SIZE);
const ENC_HASH_SIZE: usize = b64::encoded_len(HASH_SIZE);

const _: () = {
    assert!(b64::decoded_len(ENC_SALT_SIZE) == SALT_SIZE);
    assert!(b64::decoded_len(ENC_HASH_SIZE) == HASH_SIZE);
    assert!(7 + ENC_SALT_SIZE + ENC_HASH_SIZE == ENCODED_SIZE);
};

/// Parameters recovered from an encoded hash, used to recompute the hash
/// when verifying a password. The version is not carried: only 2b is
/// produced or accepted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HashParams {
    /// The stored password hash.
    pub pwd_hash: PwdHash,
    /// The stored salt.
    pub salt: Salt,
    /// The stored work factor.
    pub cost: u32,
}

/// Computes the bcrypt hash of `password` under `salt` and `cost`.
///
/// The password is truncated to 72 bytes and a NUL terminator is appended
/// before the key schedule, per the 2b convention. All working state is
/// wiped before returning.
pub(crate) fn gen_hash(password: &[u8], salt: &Salt, cost: u32) -> PwdHash {
    let klen = if password.len() > MAX_PWD_SIZE {
        log::warn!(
            "password of length {} truncated to {} bytes",
            password.len(),
            MAX_PWD_SIZE
        );
        MAX_PWD_SIZE
    } else {
        password.len()
    };

    // Copy plus the mandatory 2b NUL terminator, which counts toward klen.
    let mut key = Zeroizing::new([0u8; MAX_PWD_SIZE + 1]);
    key[..klen].copy_from_slice(&password[..klen]);
    let key = &key[..klen + 1];

    let mut state = Blowfish::init_state();
    state.expand_state(salt, key);
    for _ in 0..1u64 << cost {
        state.expand0_state(key);
        state.expand0_state(salt);
    }

    let mut cdata = [0u32; BLOCKS];
    let mut off = 0;
    for word in &mut cdata {
        *word = stream_to_word(CTEXT, &mut off);
    }

    for _ in 0..64 {
        state.encrypt_ecb(&mut cdata);
    }

    let mut ciphertext = [0u8; 4 * BLOCKS];
    for (chunk, word) in ciphertext.chunks_exact_mut(4).zip(cdata.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }

    let mut pwd_hash = [0u8; HASH_SIZE];
    pwd_hash.copy_from_slice(&ciphertext[..HASH_SIZE]);

    state.zeroize();
    cdata.zeroize();
    ciphertext.zeroize();

    pwd_hash
}

/// Serialises a hash, salt, and cost into the 60-byte `$2b$CC$...` form.
///
/// The caller guarantees `cost` is within `[MIN_COST, MAX_COST]`; the cost
/// field is always two zero-padded decimal digits.
pub fn encode_bcrypt(pwd_hash: &PwdHash, salt: &Salt, cost: u32) -> EncodedHash {
    let mut arr = [0u8; ENCODED_SIZE];
    arr[..4].copy_from_slice(b"$2b$");
    arr[4] = b'0' + (cost / 10) as u8;
    arr[5] = b'0' + (cost % 10) as u8;
    arr[6] = b'$';
    b64::encode_into(salt, &mut arr[7..7 + ENC_SALT_SIZE]);
    b64::encode_into(pwd_hash, &mut arr[29..29 + ENC_HASH_SIZE]);
    arr
}

// Parses the two-digit cost field. At least one digit must be consumed; a
// non-digit second character ends the number.
fn parse_cost(d1: u8, d2: u8) -> Option<u32> {
    if !d1.is_ascii_digit() {
        return None;
    }
    let mut cost = u32::from(d1 - b'0');
    if d2.is_ascii_digit() {
        cost = cost * 10 + u32::from(d2 - b'0');
    }
    Some(cost)
}

/// Parses a 60-byte `$2b$CC$...` hash back into its parameters.
///
/// The check is structural only: the framing and cost range are enforced,
/// while the salt and hash slots decode permissively (out-of-alphabet bytes
/// are not rejected). Whether the recovered bytes are meaningful is settled
/// by the hash comparison in verification.
///
/// ```text
/// $--$--$-----------------------------------------------------
/// 012345678901234567890123456789012345678901234567890123456789
///        |                     |
///        salt begins here      password hash begins here
/// ```
pub fn decode_bcrypt(arr: &EncodedHash) -> Option<HashParams> {
    if arr[0] != b'$' || arr[1] != b'2' || arr[2] != b'b' || arr[3] != b'$' || arr[6] != b'$' {
        return None;
    }

    let cost = parse_cost(arr[4], arr[5])?;
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return None;
    }

    let mut salt = [0u8; SALT_SIZE];
    b64::decode_into(&arr[7..7 + ENC_SALT_SIZE], &mut salt);
    let mut pwd_hash = [0u8; HASH_SIZE];
    b64::decode_into(&arr[29..29 + ENC_HASH_SIZE], &mut pwd_hash);

    Some(HashParams {
        pwd_hash,
        salt,
        cost,
    })
}

/// Views an encoded hash as text. Returns `None` if the array is not valid
/// UTF-8, which cannot happen for hashes produced by this crate.
pub fn as_str(arr: &EncodedHash) -> Option<&str> {
    std::str::from_utf8(arr).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The widely-used OpenBSD test vectors, with the salts in binary form.
    const KNOWN_ANSWERS: [(&[u8], u32, Salt, &[u8; ENCODED_SIZE]); 5] = [
        (
            b"",
            6,
            [
                0x14, 0x4b, 0x3d, 0x69, 0x1a, 0x7b, 0x4e, 0xcf,
                0x39, 0xcf, 0x73, 0x5c, 0x7f, 0xa7, 0xa7, 0x9c,
            ],
            b"$2b$06$DCq7YPn5Rq63x1Lad4cll.TV4S6ytwfsfvkgY8jIucDrjc8deX1s.",
        ),
        (
            b"a",
            6,
            [
                0xa3, 0x61, 0x2d, 0x8c, 0x9a, 0x37, 0xda, 0xc2,
                0xf9, 0x9d, 0x94, 0xda, 0x03, 0xbd, 0x45, 0x21,
            ],
            b"$2b$06$m0CrhHm10qJ3lXRY.5zDGO3rS2KdeeWLuGmsfGlMfOxih58VYVfxe",
        ),
        (
            b"abc",
            6,
            [
                0x2a, 0x1f, 0x1d, 0xc7, 0x0a, 0x3d, 0x14, 0x79,
                0x56, 0xa4, 0x6f, 0xeb, 0xe3, 0x01, 0x60, 0x17,
            ],
            b"$2b$06$If6bvum7DFjUnE9p2uDeDu0YHzrHM6tf.iqN8.yx.jNN1ILEf7h0i",
        ),
        (
            b"abcdefghijklmnopqrstuvwxyz",
            6,
            [
                0x02, 0xd1, 0x17, 0x6d, 0x74, 0x15, 0x8e, 0xe2,
                0x9c, 0xff, 0xda, 0xc6, 0x15, 0x0c, 0xf1, 0x23,
            ],
            b"$2b$06$.rCVZVOThsIa97pEDOxvGuRRgzG64bvtJ0938xuqzv18d3ZpQhstC",
        ),
        (
            b"~!@#$%^&*()      ~!@#$%^&*()PNBFRD",
            6,
            [
                0x85, 0x12, 0xae, 0x0d, 0x0f, 0xac, 0x4e, 0xc9,
                0xa5, 0x97, 0x8f, 0x79, 0xb6, 0x17, 0x10, 0x28,
            ],
            b"$2b$06$fPIsBO8qRqkjj273rfaOI.HtSV9jLDpTbZn782DC6/t7qT67P6FfO",
        ),
    ];

    #[test]
    fn openbsd_known_answers() {
        for (password, cost, salt, expected) in KNOWN_ANSWERS {
            let hash = gen_hash(password, &salt, cost);
            let arr = encode_bcrypt(&hash, &salt, cost);
            assert_eq!(&arr, expected);
        }
    }

    #[test]
    fn known_answers_decode_back() {
        for (_, cost, salt, expected) in KNOWN_ANSWERS {
            let params = decode_bcrypt(expected).unwrap();
            assert_eq!(params.salt, salt);
            assert_eq!(params.cost, cost);
        }
    }

    #[test]
    fn truncates_beyond_72_bytes() {
        let salt: Salt = [
            0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x10,
            0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0xab, 0xcd,
        ];
        let long = [b'a'; 100];
        let full = gen_hash(&long, &salt, 4);
        assert_eq!(gen_hash(&long[..73], &salt, 4), full);
        assert_eq!(gen_hash(&long[..72], &salt, 4), full);
        // the 72nd byte still matters
        assert_ne!(gen_hash(&long[..71], &salt, 4), full);
    }

    #[test]
    fn framing_round_trip() {
        let pwd_hash: PwdHash = *b"abcdefghijklmnopqrstuvw";
        let salt: Salt = *b"AAAAAAAAAAAAAAAA";
        for cost in [MIN_COST, 10, MAX_COST] {
            let arr = encode_bcrypt(&pwd_hash, &salt, cost);
            let params = decode_bcrypt(&arr).unwrap();
            assert_eq!(
                params,
                HashParams {
                    pwd_hash,
                    salt,
                    cost
                }
            );
        }
    }

    #[test]
    fn cost_is_zero_padded_decimal() {
        let arr = encode_bcrypt(&[0; HASH_SIZE], &[0; SALT_SIZE], 4);
        assert_eq!(&arr[4..6], b"04");
        let arr = encode_bcrypt(&[0; HASH_SIZE], &[0; SALT_SIZE], 31);
        assert_eq!(&arr[4..6], b"31");
    }

    #[test]
    fn decode_rejects_bad_framing() {
        let good = encode_bcrypt(&[7; HASH_SIZE], &[9; SALT_SIZE], 10);

        for (pos, byte) in [(0, b'#'), (1, b'3'), (2, b'a'), (3, b'x'), (6, b'_')] {
            let mut arr = good;
            arr[pos] = byte;
            assert!(decode_bcrypt(&arr).is_none(), "position {}", pos);
        }

        let mut arr = good;
        arr[4] = b'x';
        arr[5] = b'9';
        assert!(decode_bcrypt(&arr).is_none());
    }

    #[test]
    fn decode_rejects_cost_out_of_range() {
        for cost_field in [*b"00", *b"03", *b"32", *b"99"] {
            let mut arr = encode_bcrypt(&[0; HASH_SIZE], &[0; SALT_SIZE], 10);
            arr[4..6].copy_from_slice(&cost_field);
            assert!(decode_bcrypt(&arr).is_none());
        }
    }

    #[test]
    fn decode_tolerates_foreign_base64_bytes() {
        // Out-of-alphabet bytes in the salt/hash slots are not an error;
        // they just decode to bytes no password will verify against.
        let mut arr = encode_bcrypt(&[7; HASH_SIZE], &[9; SALT_SIZE], 10);
        arr[7] = b'=';
        arr[30] = b'!';
        assert!(decode_bcrypt(&arr).is_some());
    }

    #[test]
    fn as_str_views_ascii() {
        let arr = encode_bcrypt(&[1; HASH_SIZE], &[2; SALT_SIZE], 12);
        let text = as_str(&arr).unwrap();
        assert!(text.starts_with("$2b$12$"));
        assert_eq!(text.len(), ENCODED_SIZE);
    }
}

//! The non-standard base 64 variant used by bcrypt: alphabet `./A-Za-z0-9`,
//! no padding characters.

// BCrypt's custom base64 alphabet
const ALPHABET: &[u8; 64] = b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

// Maps an ASCII byte back to its 6-bit value, 255 elsewhere.
const INDEX: [u8; 128] = [
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
    255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255, 255,
    255, 0, 1, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 255, 255, 255, 255, 255,
    255, 255, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19,
    20, 21, 22, 23, 24, 25, 26, 27, 255, 255, 255, 255, 255, 255, 28, 29, 30,
    31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49,
    50, 51, 52, 53, 255, 255, 255, 255, 255,
];

// Out-of-alphabet bytes decode through the all-ones sentinel; the stray bits
// are masked away by the callers' shifts, never reported as an error.
#[inline]
fn char64(c: u8) -> u8 {
    INDEX[usize::from(c & 0x7f)]
}

/// Number of base64 bytes produced when encoding `n` binary bytes.
pub(crate) const fn encoded_len(n: usize) -> usize {
    let q = n / 3;
    let r = n % 3;
    q * 4 + if r == 0 { 0 } else { r + 1 }
}

/// Number of binary bytes produced when decoding `n` base64 bytes.
pub(crate) const fn decoded_len(n: usize) -> usize {
    let q = n / 4;
    let r = n % 4;
    q * 3 + if r == 0 { 0 } else { r - 1 }
}

/// Encodes `src` into `dst`, which must hold at least `encoded_len(src.len())`
/// bytes. Trailing pad bits in the final character are zero.
pub(crate) fn encode_into(src: &[u8], dst: &mut [u8]) {
    let chunks = src.chunks_exact(3);
    let tail = chunks.remainder();
    let mut i = 0;

    for chunk in chunks {
        let (f1, f2, f3) = (chunk[0], chunk[1], chunk[2]);
        dst[i] = ALPHABET[usize::from(f1 >> 2)];
        dst[i + 1] = ALPHABET[usize::from(((f1 & 0x03) << 4) | (f2 >> 4))];
        dst[i + 2] = ALPHABET[usize::from(((f2 & 0x0f) << 2) | (f3 >> 6))];
        dst[i + 3] = ALPHABET[usize::from(f3 & 0x3f)];
        i += 4;
    }

    match tail {
        &[f1] => {
            dst[i] = ALPHABET[usize::from(f1 >> 2)];
            dst[i + 1] = ALPHABET[usize::from((f1 & 0x03) << 4)];
        }
        &[f1, f2] => {
            dst[i] = ALPHABET[usize::from(f1 >> 2)];
            dst[i + 1] = ALPHABET[usize::from(((f1 & 0x03) << 4) | (f2 >> 4))];
            dst[i + 2] = ALPHABET[usize::from((f2 & 0x0f) << 2)];
        }
        _ => {}
    }
}

/// Decodes `src` into `dst`, which must hold at least `decoded_len(src.len())`
/// bytes. The tight form is expected: no `=` padding.
pub(crate) fn decode_into(src: &[u8], dst: &mut [u8]) {
    let chunks = src.chunks_exact(4);
    let tail = chunks.remainder();
    let mut i = 0;

    for chunk in chunks {
        let f1 = char64(chunk[0]);
        let f2 = char64(chunk[1]);
        let f3 = char64(chunk[2]);
        let f4 = char64(chunk[3]);
        dst[i] = (f1 << 2) | (f2 >> 4);
        dst[i + 1] = (f2 << 4) | (f3 >> 2);
        dst[i + 2] = (f3 << 6) | f4;
        i += 3;
    }

    match tail {
        &[c1, c2] => {
            let f1 = char64(c1);
            let f2 = char64(c2);
            dst[i] = (f1 << 2) | ((f2 >> 4) & 0x03);
        }
        &[c1, c2, c3] => {
            let f1 = char64(c1);
            let f2 = char64(c2);
            let f3 = char64(c3);
            dst[i] = (f1 << 2) | (f2 >> 4);
            dst[i + 1] = (f2 << 4) | (f3 >> 2);
        }
        _ => {}
    }
}

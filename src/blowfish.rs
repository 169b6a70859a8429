//! Blowfish block cipher plus the "expensive key schedule" extensions bcrypt
//! builds on. Word formation is big-endian throughout: the first byte of a
//! buffer is the most significant byte of the first 32-bit word.

use zeroize::Zeroize;

use crate::consts::{P_INIT, S_INIT};

const SUBKEYS: usize = 18;

/// Blowfish cipher state: 18 subkeys and four 256-entry S-boxes. One state is
/// built per hash computation and wiped before release.
pub(crate) struct Blowfish {
    p: [u32; SUBKEYS],
    s: [[u32; 256]; 4],
}

/// Reads the next big-endian 32-bit word from `data`, wrapping the offset
/// modulo the buffer length. This is the cyclic stream that interleaves salt
/// and key bytes into the schedule.
pub(crate) fn stream_to_word(data: &[u8], off: &mut usize) -> u32 {
    let mut word = 0u32;
    for _ in 0..4 {
        word = (word << 8) | u32::from(data[*off]);
        *off = (*off + 1) % data.len();
    }
    word
}

impl Blowfish {
    /// Copies the standard initial constants into a fresh state.
    pub(crate) fn init_state() -> Self {
        Blowfish {
            p: P_INIT,
            s: S_INIT,
        }
    }

    fn f(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();
        let h = self.s[0][usize::from(a)].wrapping_add(self.s[1][usize::from(b)]);
        (h ^ self.s[2][usize::from(c)]).wrapping_add(self.s[3][usize::from(d)])
    }

    /// 16-round Feistel encipher of one 64-bit block, with the final swap.
    fn encipher(&self, mut l: u32, mut r: u32) -> (u32, u32) {
        for i in (0..16).step_by(2) {
            l ^= self.p[i];
            r ^= self.f(l);
            r ^= self.p[i + 1];
            l ^= self.f(r);
        }
        l ^= self.p[16];
        r ^= self.p[17];
        (r, l)
    }

    /// ECB-encrypts adjacent `(L, R)` word pairs in place.
    pub(crate) fn encrypt_ecb(&self, data: &mut [u32]) {
        for block in data.chunks_exact_mut(2) {
            let (l, r) = self.encipher(block[0], block[1]);
            block[0] = l;
            block[1] = r;
        }
    }

    /// Key schedule without salt: XORs the cyclic key stream into `P`, then
    /// re-enciphers the running `(L, R)` chain through the subkeys and all
    /// four S-boxes, two entries at a time.
    pub(crate) fn expand0_state(&mut self, key: &[u8]) {
        let mut koff = 0;
        for p in &mut self.p {
            *p ^= stream_to_word(key, &mut koff);
        }

        let (mut l, mut r) = (0u32, 0u32);
        for i in (0..SUBKEYS).step_by(2) {
            let (nl, nr) = self.encipher(l, r);
            l = nl;
            r = nr;
            self.p[i] = l;
            self.p[i + 1] = r;
        }
        for sb in 0..4 {
            for i in (0..256).step_by(2) {
                let (nl, nr) = self.encipher(l, r);
                l = nl;
                r = nr;
                self.s[sb][i] = l;
                self.s[sb][i + 1] = r;
            }
        }
    }

    /// Salted key schedule: identical to [`expand0_state`] except that the
    /// next two cyclic salt words are XORed into `(L, R)` before each
    /// encipher step. The salt offset runs continuously across the subkey
    /// and S-box phases; the key offset is independent of it.
    ///
    /// [`expand0_state`]: Blowfish::expand0_state
    pub(crate) fn expand_state(&mut self, salt: &[u8], key: &[u8]) {
        let mut koff = 0;
        for p in &mut self.p {
            *p ^= stream_to_word(key, &mut koff);
        }

        let mut soff = 0;
        let (mut l, mut r) = (0u32, 0u32);
        for i in (0..SUBKEYS).step_by(2) {
            l ^= stream_to_word(salt, &mut soff);
            r ^= stream_to_word(salt, &mut soff);
            let (nl, nr) = self.encipher(l, r);
            l = nl;
            r = nr;
            self.p[i] = l;
            self.p[i + 1] = r;
        }
        for sb in 0..4 {
            for i in (0..256).step_by(2) {
                l ^= stream_to_word(salt, &mut soff);
                r ^= stream_to_word(salt, &mut soff);
                let (nl, nr) = self.encipher(l, r);
                l = nl;
                r = nr;
                self.s[sb][i] = l;
                self.s[sb][i + 1] = r;
            }
        }
    }
}

impl Zeroize for Blowfish {
    fn zeroize(&mut self) {
        self.p.zeroize();
        self.s.zeroize();
    }
}

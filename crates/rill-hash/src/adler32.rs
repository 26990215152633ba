use rill_types::Hasher;

/// Largest prime below 2^16.
const MOD: u32 = 65521;

/// Largest `n` such that `255 * n * (n + 1) / 2 + (n + 1) * (MOD - 1)`
/// fits in a `u32`. Reduction can be deferred for this many bytes.
const NMAX: usize = 5552;

/// The RFC 1950 rolling checksum used by zlib.
///
/// Two 16-bit sums: `s1` is 1 plus the sum of the bytes, `s2` is the sum
/// of every intermediate `s1`. The checksum is `s2 << 16 | s1`, so the
/// empty input hashes to `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Adler32 {
    #[must_use]
    pub fn new() -> Self {
        Self { s1: 1, s2: 0 }
    }

    /// The checksum of everything fed so far.
    pub fn checksum(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }

    /// Feed `bytes` and return the running checksum.
    pub fn write(&mut self, bytes: &[u8]) -> u32 {
        let (mut s1, mut s2) = (self.s1, self.s2);
        for chunk in bytes.chunks(NMAX) {
            for &b in chunk {
                s1 += u32::from(b);
                s2 += s1;
            }
            s1 %= MOD;
            s2 %= MOD;
        }
        self.s1 = s1;
        self.s2 = s2;
        self.checksum()
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Adler32 {
    fn initialize(&mut self) {
        *self = Self::new();
    }

    fn update(&mut self, bytes: &[u8]) -> u64 {
        u64::from(self.write(bytes))
    }

    fn checksum_u64(&self) -> u64 {
        u64::from(self.checksum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PI: &[u8] = b"3.1415926535897932384626433832795028841971693993751058209749445";

    // wants[i] is the checksum of PI[..i].
    const PI_WANTS: [u32; 64] = [
        0x0000_0001, 0x0034_0034, 0x0096_0062, 0x0129_0093, 0x01F0_00C7, 0x02E8_00F8,
        0x0415_012D, 0x057B_0166, 0x0713_0198, 0x08E1_01CE, 0x0AE4_0203, 0x0D1A_0236,
        0x0F85_026B, 0x1228_02A3, 0x1504_02DC, 0x1817_0313, 0x1B63_034C, 0x1EE2_037F,
        0x2293_03B1, 0x2677_03E4, 0x2A93_041C, 0x2EE3_0450, 0x3369_0486, 0x3821_04B8,
        0x3D0F_04EE, 0x4231_0522, 0x4786_0555, 0x4D0E_0588, 0x52CE_05C0, 0x58C1_05F3,
        0x5EE6_0625, 0x6542_065C, 0x6BD7_0695, 0x72A1_06CA, 0x799B_06FA, 0x80C7_072C,
        0x882B_0764, 0x8FC7_079C, 0x9797_07D0, 0x9F98_0801, 0xA7D2_083A, 0xB043_0871,
        0xB8E5_08A2, 0xC1BD_08D8, 0xCACE_0911, 0xD412_0944, 0xDD8F_097D, 0xE745_09B6,
        0xF12E_09E9, 0xFB4E_0A20, 0x05B2_0A55, 0x1038_0A86, 0x1AEE_0AB6, 0x25D9_0AEB,
        0x30FC_0B23, 0x3C51_0B55, 0x47D6_0B85, 0x5394_0BBE, 0x5F89_0BF5, 0x6BB2_0C29,
        0x7814_0C62, 0x84AA_0C96, 0x9174_0CCA, 0x9E73_0CFF,
    ];

    #[test]
    fn empty_is_one() {
        assert_eq!(Adler32::new().checksum(), 1);
        assert_eq!(Adler32::new().update(&[]), 1);
    }

    #[test]
    fn wikipedia() {
        assert_eq!(Adler32::new().write(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn pi_prefixes() {
        assert_eq!(PI.len(), 63);
        for (i, &want) in PI_WANTS.iter().enumerate() {
            let mut h = Adler32::new();
            assert_eq!(h.write(&PI[..i]), want, "prefix length {i}");
        }
    }

    #[test]
    fn pi_byte_at_a_time() {
        let mut h = Adler32::new();
        for (i, &b) in PI.iter().enumerate() {
            assert_eq!(h.write(&[b]), PI_WANTS[i + 1], "after byte {i}");
        }
    }

    #[test]
    fn long_run_of_0xff_reduces() {
        // Exercises the deferred modulo well past NMAX.
        let data = vec![0xFFu8; 3 * NMAX + 17];
        let mut whole = Adler32::new();
        let mut pieces = Adler32::new();
        whole.write(&data);
        for b in &data {
            pieces.write(std::slice::from_ref(b));
        }
        assert_eq!(whole, pieces);
    }

    #[test]
    fn initialize_starts_fresh() {
        let mut h = Adler32::new();
        h.update(b"stale");
        h.initialize();
        assert_eq!(h.checksum_u64(), 1);
        assert_eq!(h.update(b"Wikipedia"), 0x11E6_0398);
    }

    proptest! {
        #[test]
        fn split_anywhere(data in proptest::collection::vec(any::<u8>(), 0..2048), k in 0usize..2048) {
            let k = k.min(data.len());
            let mut a = Adler32::new();
            a.write(&data);
            let mut b = Adler32::new();
            b.write(&data[..k]);
            b.write(&data[k..]);
            prop_assert_eq!(a.checksum(), b.checksum());
        }
    }
}

use rill_types::Hasher;

/// IEEE 802.3 polynomial, bit-reflected.
const POLY: u32 = 0xEDB8_8320;

const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 == 1 { (c >> 1) ^ POLY } else { c >> 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// CRC-32 as used by gzip, PNG and zip.
///
/// Register starts at all ones and is inverted on output, so the empty
/// input hashes to `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Crc32 {
    // Stored inverted: 0 here means the register holds !0.
    state: u32,
}

impl Crc32 {
    #[must_use]
    pub fn new() -> Self {
        Self { state: 0 }
    }

    pub fn checksum(&self) -> u32 {
        self.state
    }

    /// Feed `bytes` and return the running checksum.
    pub fn write(&mut self, bytes: &[u8]) -> u32 {
        let mut c = !self.state;
        for &b in bytes {
            c = TABLE[((c ^ u32::from(b)) & 0xFF) as usize] ^ (c >> 8);
        }
        self.state = !c;
        self.state
    }
}

impl Hasher for Crc32 {
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

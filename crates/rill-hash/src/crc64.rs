use rill_types::Hasher;

/// ECMA-182 polynomial, bit-reflected, as used by xz.
const POLY: u64 = 0xC96C_5795_D787_0F42;

const TABLE: [u64; 256] = {
    let mut table = [0u64; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u64;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 == 1 { (c >> 1) ^ POLY } else { c >> 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
};

/// CRC-64/XZ: reflected ECMA-182, all-ones init and final XOR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Crc64 {
    state: u64,
}

impl Crc64 {
    #[must_use]
    pub fn new() -> Self {
        Self { state: 0 }
    }

    pub fn checksum(&self) -> u64 {
        self.state
    }

    pub fn write(&mut self, bytes: &[u8]) -> u64 {
        let mut c = !self.state;
        for &b in bytes {
            c = TABLE[((c ^ u64::from(b)) & 0xFF) as usize] ^ (c >> 8);
        }
        self.state = !c;
        self.state
    }
}

impl Hasher for Crc64 {
    fn initialize(&mut self) {
        *self = Self::new();
    }

    fn update(&mut self, bytes: &[u8]) -> u64 {
        self.write(bytes)
    }

    fn checksum_u64(&self) -> u64 {
        self.state
    }
}

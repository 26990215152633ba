/// Settings for a pump.
///
/// ```text
/// ┌───────────────────┬─────────┬─────────────────────────────────────────┐
/// │ Field             │ Default │ Purpose                                 │
/// ├───────────────────┼─────────┼─────────────────────────────────────────┤
/// │ input_buffer_len  │ 64 KiB  │ Size of the source buffer               │
/// │ output_buffer_len │ 64 KiB  │ Size of the destination buffer          │
/// │ read_limit        │ none    │ Cap on bytes offered per decoder call   │
/// │ write_limit       │ none    │ Cap on slots offered per decoder call   │
/// │ ignore_checksum   │ false   │ Forwarded to set_ignore_checksum        │
/// │ dictionary        │ none    │ Installed on a DictionaryRequired note  │
/// └───────────────────┴─────────┴─────────────────────────────────────────┘
/// ```
///
/// The limits exist to exercise decoders under starvation; they never
/// change the decoded result, only the number of calls it takes. A limit
/// of zero is treated as one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PumpConfig {
    pub input_buffer_len: usize,
    pub output_buffer_len: usize,
    pub read_limit: Option<usize>,
    pub write_limit: Option<usize>,
    pub ignore_checksum: bool,
    pub dictionary: Option<Vec<u8>>,
}

pub const DEFAULT_BUFFER_LEN: usize = 64 * 1024;

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            input_buffer_len: DEFAULT_BUFFER_LEN,
            output_buffer_len: DEFAULT_BUFFER_LEN,
            read_limit: None,
            write_limit: None,
            ignore_checksum: false,
            dictionary: None,
        }
    }
}

impl PumpConfig {
    #[must_use]
    pub fn with_limits(mut self, read_limit: Option<usize>, write_limit: Option<usize>) -> Self {
        self.read_limit = read_limit;
        self.write_limit = write_limit;
        self
    }

    #[must_use]
    pub fn with_dictionary(mut self, dictionary: Vec<u8>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    #[must_use]
    pub fn with_ignore_checksum(mut self, ignore: bool) -> Self {
        self.ignore_checksum = ignore;
        self
    }

    pub(crate) fn input_len(&self) -> usize {
        self.input_buffer_len.max(1)
    }

    pub(crate) fn output_len(&self) -> usize {
        self.output_buffer_len.max(1)
    }

    pub(crate) fn read_limit(&self) -> Option<usize> {
        self.read_limit.map(|n| n.max(1))
    }

    pub(crate) fn write_limit(&self) -> Option<usize> {
        self.write_limit.map(|n| n.max(1))
    }
}

//! Bank catalog
//!
//! Every bank type the writer knows about, with the ZEBRA parameters that
//! go into its bank header and I/O characteristic. The table is part of the
//! wire contract: readers rely on these identifiers, link counts and
//! characteristic words.

/// Pack a four character bank name into its on-disk word
pub const fn bank_name(name: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*name)
}

/// Number of link words in the MAST bank characteristic
pub const MAST_LINKS: usize = 25;

/// Software version recorded in every MAST bank
pub const MAST_VERSION: f32 = 3.0190;

/// MAST bank data: current and original version
pub const MAST_DATA: [u32; 2] = [MAST_VERSION.to_bits(), MAST_VERSION.to_bits()];

/// Recognized bank types
///
/// The discriminant is the stable catalog index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankKind {
    /// PMT event record (variable size)
    Zdab = 0,
    /// Supporting bank, only ever written in front of another bank
    Mast = 1,
    /// Run header
    Rhdr = 2,
    /// Pedestal settings
    Eped = 3,
    /// Trigger settings
    Trig = 4,
    /// Source status
    Sosl = 5,
    /// Calibration source manipulator status
    Cast = 6,
    /// Acrylic vessel status
    Caac = 7,
}

impl BankKind {
    /// All kinds in catalog order
    pub const ALL: [Self; 8] = [
        Self::Zdab,
        Self::Mast,
        Self::Rhdr,
        Self::Eped,
        Self::Trig,
        Self::Sosl,
        Self::Cast,
        Self::Caac,
    ];

    /// Catalog index of this kind
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Kind stored at a catalog index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Kind for an on-disk bank name word
    pub fn from_name(name: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.definition().name == name)
    }

    /// Catalog entry for this kind
    pub fn definition(self) -> &'static BankDef {
        &CATALOG[self.index()]
    }

    /// Whether this is the variable-size primary event bank
    pub const fn is_primary(self) -> bool {
        matches!(self, Self::Zdab)
    }
}

impl std::fmt::Display for BankKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.definition().tag)
    }
}

/// Static description of one bank type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankDef {
    /// Bank kind
    pub kind: BankKind,
    /// Four character name
    pub tag: &'static str,
    /// Name packed into a word
    pub name: u32,
    /// Numeric bank identifier
    pub id: u32,
    /// Data words, 0 when the size is only known at write time
    pub words: u32,
    /// Number of links
    pub links: u32,
    /// Status word
    pub status: u32,
    /// I/O characteristic words (first word plus control/link words)
    pub iochar: &'static [u32],
}

impl BankDef {
    /// Nominal data word count (0 for the variable-size primary bank)
    pub const fn word_count(&self) -> u32 {
        self.words
    }

    /// Number of I/O control and link words following the first
    /// characteristic word
    pub const fn io_link_words(&self) -> usize {
        (self.iochar[0] & 0x0000_ffff) as usize - 12
    }

    /// Size of the bank header: characteristic words plus the fixed header
    pub const fn header_words(&self) -> usize {
        1 + self.io_link_words() + crate::block::BANK_HEADER_WORDS
    }
}

const fn def(
    kind: BankKind,
    tag: &'static str,
    id: u32,
    words: u32,
    links: u32,
    status: u32,
    iochar: &'static [u32],
) -> BankDef {
    let bytes = tag.as_bytes();
    BankDef {
        kind,
        tag,
        name: bank_name(&[bytes[0], bytes[1], bytes[2], bytes[3]]),
        id,
        words,
        links,
        status,
        iochar,
    }
}

/// MAST characteristic; its link words are filled in per record
const MAST_IOCHAR: [u32; 1 + MAST_LINKS] = {
    let mut words = [0u32; 1 + MAST_LINKS];
    words[0] = 0x0003_0025;
    words
};

/// The catalog, indexed by [`BankKind::index`]
pub static CATALOG: [BankDef; 8] = [
    def(BankKind::Zdab, "ZDAB", 6, 0, 0, 0x00000, &[0x0002_000c]),
    def(BankKind::Mast, "MAST", 1, 2, MAST_LINKS as u32, 0x00004, &MAST_IOCHAR),
    def(BankKind::Rhdr, "RHDR", 5, 18, 0, 0x00000, &[0x0002_000c]),
    def(BankKind::Eped, "EPED", 6, 8, 0, 0x00000, &[0x0002_000c]),
    def(BankKind::Trig, "TRIG", 7, 26, 0, 0x00000, &[0x0002_000c]),
    def(BankKind::Sosl, "SOSL", 8, 8, 0, 0x00000, &[0x0323_000c]),
    def(
        BankKind::Cast,
        "CAST",
        10,
        34,
        0,
        0x80000,
        &[0xc9a3_000e, 0x4004_1803, 0x000e_005a],
    ),
    def(BankKind::Caac, "CAAC", 11, 13, 0, 0x00000, &[0x0003_000c]),
];

/// Catalog index for a bank name word, `None` if the bank is not recognized
pub fn lookup_index(name: u32) -> Option<usize> {
    BankKind::from_name(name).map(BankKind::index)
}

/// Catalog entry at `index`
pub fn definition(index: usize) -> Option<&'static BankDef> {
    CATALOG.get(index)
}

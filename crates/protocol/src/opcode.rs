/// The request opcodes this cache's wire format dispatches on. Numbering
/// is this rewrite's own choice — the original source left the wire values
/// as an internal implementation detail of `query.h`, not part of the
/// distilled spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Get = 0,
    Set = 1,
    Ttl = 2,
    MSet = 3,
    MTtl = 4,
    MGet = 5,
    Del = 6,
    MDel = 7,
    Inc = 8,
    Dec = 9,
    MInc = 10,
    MDec = 11,
    Lock = 12,
    MLock = 13,
    Unlock = 14,
    MUnlock = 15,
    Count = 16,
    Stats = 17,
    Ping = 18,
    Meta = 19,
    Keys = 20,
    End = 21,
}

impl Opcode {
    pub fn from_u16(v: u16) -> Option<Self> {
        use Opcode::*;
        Some(match v {
            0 => Get,
            1 => Set,
            2 => Ttl,
            3 => MSet,
            4 => MTtl,
            5 => MGet,
            6 => Del,
            7 => MDel,
            8 => Inc,
            9 => Dec,
            10 => MInc,
            11 => MDec,
            12 => Lock,
            13 => MLock,
            14 => Unlock,
            15 => MUnlock,
            16 => Count,
            17 => Stats,
            18 => Ping,
            19 => Meta,
            20 => Keys,
            21 => End,
            _ => return None,
        })
    }

    /// Whether this opcode applies a single-key semantic to every key
    /// matching a pattern in one index walk.
    pub fn is_bulk(self) -> bool {
        matches!(
            self,
            Opcode::MSet
                | Opcode::MTtl
                | Opcode::MGet
                | Opcode::MDel
                | Opcode::MInc
                | Opcode::MDec
                | Opcode::MLock
                | Opcode::MUnlock
                | Opcode::Count
                | Opcode::Keys
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_every_opcode() {
        for raw in 0..=21u16 {
            assert_eq!(Opcode::from_u16(raw).map(|o| o as u16), Some(raw));
        }
    }

    #[test]
    fn unknown_opcode_is_none() {
        assert!(Opcode::from_u16(22).is_none());
    }
}

//! Command schema.
//!
//! A flat, compile-time table of the six recognised operations, shared by
//! the client (to encode a request from CLI arguments) and the server
//! (to validate a decoded request before dispatching it). Expressed as a
//! tagged enum rather than a function-pointer table, which keeps the
//! match in `dispatch` exhaustive and checked at compile time.

use crate::protocol::ArgType;

/// Protocol operation codes. Numeric values are stable on the wire
/// (`OP_A = 0` .. `OP_F = 5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Add a document.
    A = 0,
    /// Read a document's metadata.
    C = 1,
    /// Delete a document.
    D = 2,
    /// Count keyword occurrences (by line) in a document.
    L = 3,
    /// Parallel keyword search across all live documents.
    S = 4,
    /// Flush the cache and shut down.
    F = 5,
}

impl Opcode {
    pub const ALL: [Opcode; 6] = [
        Opcode::A,
        Opcode::C,
        Opcode::D,
        Opcode::L,
        Opcode::S,
        Opcode::F,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ();

    fn try_from(v: u8) -> Result<Self, ()> {
        match v {
            0 => Ok(Opcode::A),
            1 => Ok(Opcode::C),
            2 => Ok(Opcode::D),
            3 => Ok(Opcode::L),
            4 => Ok(Opcode::S),
            5 => Ok(Opcode::F),
            _ => Err(()),
        }
    }
}

/// One row of the command schema.
#[derive(Debug, Clone, Copy)]
pub struct CommandEntry {
    /// Client CLI flag, e.g. `"-a"`.
    pub flag: &'static str,
    pub opcode: Opcode,
    /// Expected argument types, in order. An entry with `argc_max >
    /// arg_types.len()` means the trailing type vector entry applies to
    /// every optional argument (only `S`'s optional worker-count arg
    /// needs this, and it is listed explicitly below).
    pub arg_types: &'static [ArgType],
    pub argc_min: u8,
    pub argc_max: u8,
    /// `true` if the command must run on the dispatcher's own task
    /// (it mutates shared state or controls server lifecycle).
    pub blocking: bool,
}

const ADD_TYPES: [ArgType; 4] = [ArgType::Str, ArgType::Str, ArgType::U32, ArgType::Str];
const U32_TYPES: [ArgType; 1] = [ArgType::U32];
const LIST_TYPES: [ArgType; 2] = [ArgType::U32, ArgType::Str];
const SEARCH_TYPES: [ArgType; 2] = [ArgType::Str, ArgType::U32];
const NO_TYPES: [ArgType; 0] = [];

/// The canonical command table.
pub static COMMAND_TABLE: [CommandEntry; 6] = [
    CommandEntry {
        flag: "-a",
        opcode: Opcode::A,
        arg_types: &ADD_TYPES,
        argc_min: 4,
        argc_max: 4,
        blocking: true,
    },
    CommandEntry {
        flag: "-c",
        opcode: Opcode::C,
        arg_types: &U32_TYPES,
        argc_min: 1,
        argc_max: 1,
        blocking: false,
    },
    CommandEntry {
        flag: "-d",
        opcode: Opcode::D,
        arg_types: &U32_TYPES,
        argc_min: 1,
        argc_max: 1,
        blocking: true,
    },
    CommandEntry {
        flag: "-l",
        opcode: Opcode::L,
        arg_types: &LIST_TYPES,
        argc_min: 2,
        argc_max: 2,
        blocking: false,
    },
    CommandEntry {
        flag: "-s",
        opcode: Opcode::S,
        arg_types: &SEARCH_TYPES,
        argc_min: 1,
        argc_max: 2,
        blocking: false,
    },
    CommandEntry {
        flag: "-f",
        opcode: Opcode::F,
        arg_types: &NO_TYPES,
        argc_min: 0,
        argc_max: 0,
        blocking: true,
    },
];

/// Looks up a command row by opcode.
pub fn lookup_by_opcode(op: Opcode) -> Option<&'static CommandEntry> {
    COMMAND_TABLE.iter().find(|e| e.opcode == op)
}

/// Matches `args[0]` against each entry's flag, then checks that
/// `args.len() - 1` falls within `[argc_min, argc_max]`.
pub fn parse_cli(args: &[String]) -> Option<&'static CommandEntry> {
    let flag = args.first()?;
    let entry = COMMAND_TABLE.iter().find(|e| e.flag == flag)?;
    let argc = (args.len() - 1) as u8;
    if argc < entry.argc_min || argc > entry.argc_max {
        return None;
    }
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_opcode_round_trips_through_lookup() {
        for op in Opcode::ALL {
            let entry = lookup_by_opcode(op).expect("every opcode has a row");
            assert_eq!(entry.opcode, op);
        }
    }

    #[test]
    fn parse_cli_matches_flag_and_arity() {
        let args: Vec<String> = vec!["-c".into(), "0".into()];
        let entry = parse_cli(&args).unwrap();
        assert_eq!(entry.opcode, Opcode::C);
    }

    #[test]
    fn parse_cli_rejects_bad_arity() {
        let args: Vec<String> = vec!["-c".into(), "0".into(), "1".into()];
        assert!(parse_cli(&args).is_none());
    }

    #[test]
    fn parse_cli_accepts_search_with_optional_worker_count() {
        let minimal: Vec<String> = vec!["-s".into(), "term".into()];
        assert!(parse_cli(&minimal).is_some());
        let with_workers: Vec<String> = vec!["-s".into(), "term".into(), "4".into()];
        assert!(parse_cli(&with_workers).is_some());
    }

    #[test]
    fn parse_cli_rejects_unknown_flag() {
        let args: Vec<String> = vec!["-z".into()];
        assert!(parse_cli(&args).is_none());
    }
}

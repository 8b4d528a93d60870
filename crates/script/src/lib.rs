//! The collaboration boundary between the H.264/HDMV cores and whatever
//! container-level script-building tool assembles the final remux.
//!
//! This crate intentionally contains no logic of its own: it is the shape of
//! the contract described in §6.4 of the core's design, nothing more. The
//! cores never write bytes themselves; they emit [`ScriptCommand`]s to a
//! [`ScriptSink`] and leave the actual container writing to the caller.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![deny(missing_docs)]
#![deny(unsafe_code)]

/// How a byte range introduced by [`ScriptCommand::AddData`] or
/// [`ScriptCommand::AddDataBlock`] relates to whatever's already at that
/// offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchMode {
    /// The new bytes are inserted; nothing at `dst_offset` is replaced.
    Insert,
    /// The new bytes replace existing bytes starting at `dst_offset`.
    Overwrite,
}

/// One instruction in the script command stream.
///
/// A core never mutates source bytes directly. Instead it describes, in
/// order, how the caller's container writer should assemble the output file
/// from spans of the original source(s) plus any patched data the core
/// produced (a rebuilt SPS, a rewritten buffering-period SEI, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    /// Registers a source file and returns a handle for later
    /// `copy_pes_payload` calls. `path` is caller-opaque; cores never open it.
    SetSourceFile {
        /// A caller-defined path or identifier for the source file.
        path: String,
    },
    /// Starts a new PES frame carrying the given timestamps, in 27 MHz ticks.
    /// `dts` is `None` for frames that only carry a PTS (audio-style, or a
    /// segment with no separate decode time).
    StartFrame {
        /// Presentation timestamp.
        pts: i64,
        /// Decode timestamp, when distinct from `pts`.
        dts: Option<i64>,
    },
    /// Copies `length` bytes from `src_offset` in source `src_idx` to
    /// `dst_offset` in the output.
    CopyPesPayload {
        /// The source file handle returned by `SetSourceFile`.
        src_idx: u32,
        /// Offset into the output stream.
        dst_offset: u64,
        /// Offset into the source file.
        src_offset: u64,
        /// Number of bytes to copy.
        length: u64,
    },
    /// Inserts or overwrites `bytes` at `dst_offset` in the output.
    AddData {
        /// Offset into the output stream.
        dst_offset: u64,
        /// Whether this inserts new bytes or overwrites existing ones.
        mode: PatchMode,
        /// The patched bytes themselves.
        bytes: Vec<u8>,
    },
    /// Inserts or overwrites, at `dst_offset`, a reference to a previously
    /// registered reusable data block (the de-duplication pool described in
    /// the patching behavior), rather than inlining the bytes again.
    AddDataBlock {
        /// Offset into the output stream.
        dst_offset: u64,
        /// Whether this inserts new bytes or overwrites existing ones.
        mode: PatchMode,
        /// Index into the script's reusable data block table.
        block_idx: u32,
    },
    /// Marks the end of the command stream.
    EndMarker,
}

/// A destination for the [`ScriptCommand`] stream emitted by a core.
///
/// Kept as a trait, mirroring [`diagnostics::DiagnosticSink`], so a caller's
/// actual container-writing implementation is never a dependency of the
/// parsing/validation cores.
pub trait ScriptSink {
    /// Records one command, in the order it was emitted.
    fn emit(&mut self, command: ScriptCommand);
}

/// A [`ScriptSink`] that collects every command into a `Vec`, in order.
/// Useful for tests and for callers that want to inspect or replay the
/// command stream before executing it.
#[derive(Debug, Default, Clone)]
pub struct CollectingScriptSink {
    commands: Vec<ScriptCommand>,
}

impl CollectingScriptSink {
    /// Creates an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every command collected so far.
    pub fn commands(&self) -> &[ScriptCommand] {
        &self.commands
    }

    /// Consumes the sink, returning the collected commands.
    pub fn into_commands(self) -> Vec<ScriptCommand> {
        self.commands
    }
}

impl ScriptSink for CollectingScriptSink {
    fn emit(&mut self, command: ScriptCommand) {
        self.commands.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_commands_in_order() {
        let mut sink = CollectingScriptSink::new();
        sink.emit(ScriptCommand::SetSourceFile { path: "in.h264".to_string() });
        sink.emit(ScriptCommand::StartFrame { pts: 100, dts: Some(90) });
        sink.emit(ScriptCommand::EndMarker);
        assert_eq!(sink.commands().len(), 3);
        assert_eq!(sink.commands()[2], ScriptCommand::EndMarker);
    }
}

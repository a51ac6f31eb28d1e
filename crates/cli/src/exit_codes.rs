//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `cgrid` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                              |
//! |---------|-----------|------------------------------------------|
//! | 0       | Universal | Success                                  |
//! | 1       | Universal | General error (unspecified)              |
//! | 2       | Universal | CLI usage error (bad args, missing file) |
//! | 3-9     | preview   | Load, config and gating outcomes         |
//! | 10-19   | commit    | Persistence collaborator failures        |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Preview (3-9)
// =============================================================================

/// Structural block: no headers, only headers, or missing required columns.
pub const EXIT_PREVIEW_BLOCKED: u8 = 3;

/// Rows have missing values, invalid formats or duplicates.
pub const EXIT_PREVIEW_ISSUES: u8 = 4;

/// Input file could not be read or decoded.
pub const EXIT_LOAD: u8 = 5;

/// Config file could not be parsed or failed validation.
pub const EXIT_CONFIG: u8 = 6;

// =============================================================================
// Commit (10-19)
// =============================================================================

/// Commit transport or server failure. Nothing was reconciled.
pub const EXIT_COMMIT_FAILED: u8 = 10;

/// Commit succeeded but some existing rows could not be traced to a source row.
pub const EXIT_COMMIT_UNRESOLVED: u8 = 11;

//! Process exit codes.

/// Command completed and everything checked out.
pub const EXIT_SUCCESS: i32 = 0;

/// Command ran but found problems: invalid data or a schema with broken
/// dependencies.
pub const EXIT_WARNING: i32 = 1;

/// Command could not run.
pub const EXIT_ERROR: i32 = 2;

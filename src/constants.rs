// Constants for the tinyj front end

/// Maximum number of symbol table entries before the parse is aborted
/// Constants generated for literals count against this limit too
pub const MAX_SYMBOL_ENTRIES: usize = 10_000;

/// Maximum number of scopes opened over one compilation, including closed ones
pub const MAX_SCOPE_ENTRIES: usize = 1_000;

/// Prefix of generated names for literal constants (`$C0001`, `$C0002`, ...)
pub const CONSTANT_NAME_PREFIX: char = 'C';

/// Largest element count accepted in one `[n]` array modifier
pub const MAX_ARRAY_SIZE: usize = 1 << 20;

/// Cap on the slot size of any type; nested arrays saturate here
pub const MAX_TYPE_SIZE: usize = u32::MAX as usize;

/// Offset recorded for global entries, which are not frame-relative
pub const GLOBAL_OFFSET: i64 = -1;

/// Well-known port for the client service interface (spec.md §6).
pub const DEFAULT_CLIENT_PORT: u16 = 48800;

/// Well-known port for the registration interface (spec.md §6).
pub const DEFAULT_REGISTRATION_PORT: u16 = 48801;

/// The naming server's well-known registration port (spec.md §6), mirrored
/// here rather than depending on the `naming-server` crate just for one
/// constant.
pub const DEFAULT_REGISTRATION_PORT: u16 = 48801;
